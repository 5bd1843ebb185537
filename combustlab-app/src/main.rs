use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use combustlab_schemas::{
    fuel::{Appliance, KnownFuel},
    summary::{ChartKind, Metric},
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod plotting;
mod workflow;

#[derive(Parser)]
#[command(name = "combustlab", about = "Combustion Lab Analyzer", version)]
struct Cli {
    /// Settings file; defaults to ./combustlab.yaml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate energy and PM emission factor for a run and save the augmented data
    Record(RecordArgs),
    /// Bar chart of a per-run metric by fuel type with 95% confidence intervals
    Summarize {
        #[arg(long, value_enum)]
        metric: MetricArg,
        /// Write the chart to this PNG file
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Line or bar chart of any column across saved runs
    Plot {
        #[arg(long, value_enum, default_value = "line")]
        chart: ChartArg,
        #[arg(long)]
        x: String,
        #[arg(long)]
        y: String,
        /// Draw every run in one series instead of one series per file
        #[arg(long)]
        no_group: bool,
        #[arg(long)]
        output: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the axis choices available for a set of saved runs
    Columns {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
pub struct RecordArgs {
    /// Fuel mass (kg)
    #[arg(long, default_value_t = 0.0)]
    pub fuel_mass: f64,
    /// Firelighter mass (kg)
    #[arg(long, default_value_t = 0.0)]
    pub firelighter_mass: f64,
    /// Kindling mass (kg)
    #[arg(long, default_value_t = 0.0)]
    pub kindling_mass: f64,
    /// Measured PM mass (g)
    #[arg(long, default_value_t = 0.0)]
    pub pm_mass: f64,
    #[arg(long, value_enum)]
    pub fuel: FuelArg,
    /// Name of the fuel when --fuel other
    #[arg(long)]
    pub custom_fuel_name: Option<String>,
    /// LHV of the custom fuel (MJ/kg)
    #[arg(long)]
    pub custom_lhv: Option<f64>,
    #[arg(long, value_enum)]
    pub appliance: ApplianceArg,
    /// Run date (YYYY-MM-DD), today when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Raw instrument export (.xlsx, .xls, .csv or .txt)
    #[arg(long)]
    pub raw: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FuelArg {
    Wood,
    Briquettes,
    Bituminous,
    Smokeless,
    Sod,
    Firelighters,
    Other,
}

impl FuelArg {
    pub fn known(self) -> Option<KnownFuel> {
        match self {
            FuelArg::Wood => Some(KnownFuel::Wood),
            FuelArg::Briquettes => Some(KnownFuel::Briquettes),
            FuelArg::Bituminous => Some(KnownFuel::Bituminous),
            FuelArg::Smokeless => Some(KnownFuel::Smokeless),
            FuelArg::Sod => Some(KnownFuel::Sod),
            FuelArg::Firelighters => Some(KnownFuel::Firelighters),
            FuelArg::Other => None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ApplianceArg {
    OpenFireplace,
    ClosedStove,
}

impl From<ApplianceArg> for Appliance {
    fn from(arg: ApplianceArg) -> Self {
        match arg {
            ApplianceArg::OpenFireplace => Appliance::OpenFireplace,
            ApplianceArg::ClosedStove => Appliance::ClosedStove,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    PmEf,
    TotalEnergy,
    AverageMdot,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::PmEf => Metric::PmEmissionFactor,
            MetricArg::TotalEnergy => Metric::TotalEnergy,
            MetricArg::AverageMdot => Metric::AverageMdotFuel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartArg {
    Line,
    Bar,
}

impl From<ChartArg> for ChartKind {
    fn from(arg: ChartArg) -> Self {
        match arg {
            ChartArg::Line => ChartKind::Line,
            ChartArg::Bar => ChartKind::Bar,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    println!("--- Combustion Lab Analyzer ---");

    let config = config::LabConfig::load(cli.config.as_deref())?;
    tracing::debug!(data_dir = %config.data_dir.display(), "settings resolved");

    match cli.command {
        Commands::Record(args) => workflow::record(&args, &config),
        Commands::Summarize {
            metric,
            output,
            files,
        } => workflow::summarize(&files, metric.into(), output.as_deref(), &config),
        Commands::Plot {
            chart,
            x,
            y,
            no_group,
            output,
            files,
        } => workflow::plot(&files, chart.into(), &x, &y, !no_group, &output, &config),
        Commands::Columns { files } => workflow::columns(&files, &config),
    }
}
