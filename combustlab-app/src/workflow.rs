use crate::config::LabConfig;
use crate::plotting;
use crate::RecordArgs;
use anyhow::{bail, Context, Result};
use combustlab_core::{
    aggregate::{self, MetricSummary, UploadedFile},
    error::{ComputationWarning, LabError},
    recorder::{self, SavedRunReport},
    table::Table,
};
use combustlab_schemas::{
    fuel::{CustomFuel, FuelType},
    run::{PmEmissionFactor, RunInput},
    summary::{ChartKind, Metric},
};
use std::path::{Path, PathBuf};

/// Builds the run input from the form arguments, computes and saves the run.
pub fn record(args: &RecordArgs, config: &LabConfig) -> Result<()> {
    println!("\n--- [Record] Calculate & Save Results ---");

    let fuel_type = match args.fuel.known() {
        Some(fuel) => FuelType::Known(fuel),
        None => FuelType::Other(CustomFuel {
            name: args.custom_fuel_name.clone().unwrap_or_default(),
            lhv_mj_per_kg: args.custom_lhv.unwrap_or(0.0),
        }),
    };
    let input = RunInput {
        fuel_mass_kg: args.fuel_mass,
        firelighter_mass_kg: args.firelighter_mass,
        kindling_mass_kg: args.kindling_mass,
        pm_mass_g: args.pm_mass,
        fuel_type,
        appliance: args.appliance.into(),
        date: args
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
    };

    let report = recorder::record_run(&input, args.raw.as_deref(), &config.data_dir, &config.lhv)
        .context("Error during calculation")?;
    print_run_report(&report);
    Ok(())
}

fn print_run_report(report: &SavedRunReport) {
    print_warnings(&report.warnings);
    println!("Data calculated and saved as {}", report.filename);
    println!("  - Path: {}", report.path.display());
    println!(
        "  - Total Energy Loaded: {:.3} MJ",
        report.energy.total_energy_mj
    );
    match report.energy.pm_emission_factor {
        PmEmissionFactor::Computed(ef) => println!("  - PM Emission Factor: {:.6} g/MJ", ef),
        PmEmissionFactor::ZeroEnergy => println!("  - PM Emission Factor: undefined (zero energy)"),
    }
    println!("\nPreview:");
    print!("{}", render_table(&report.preview));
}

/// Summarises a per-run metric by fuel type and optionally draws the error-bar chart.
pub fn summarize(
    files: &[PathBuf],
    metric: Metric,
    output: Option<&Path>,
    config: &LabConfig,
) -> Result<()> {
    println!("\n--- [Summarize] {} by Fuel Type (95% CI) ---", metric.column_name());
    let uploads = read_uploads(files)?;

    let summary = match aggregate::summarize(&uploads, metric) {
        Ok(summary) => summary,
        Err(LabError::InsufficientData { valid, skipped }) => {
            print_warnings(&skipped);
            println!(
                "At least two valid files with consistent values are required (found {}).",
                valid
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to summarize runs"),
    };

    print_warnings(&summary.warnings);
    print_summary(&summary);

    if let Some(output) = output {
        plotting::plot_error_bars(output, &summary, &config.plot)?;
        println!("\nChart saved to '{}'.", output.display());
    }
    Ok(())
}

fn print_summary(summary: &MetricSummary) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |v| format!("{:.6}", v));
    println!(
        "{:<20} {:>12} {:>12} {:>6} {:>12} {:>12}",
        "Fuel Type", "mean", "std", "count", "sem", "ci95"
    );
    for stat in &summary.stats {
        println!(
            "{:<20} {:>12.6} {:>12} {:>6} {:>12} {:>12}",
            stat.fuel_label,
            stat.mean,
            fmt(stat.std),
            stat.count,
            fmt(stat.sem),
            fmt(stat.ci95)
        );
    }
}

/// Combines saved runs and renders a line or bar chart of `y` against `x`.
pub fn plot(
    files: &[PathBuf],
    chart: ChartKind,
    x: &str,
    y: &str,
    group_by_file: bool,
    output: &Path,
    config: &LabConfig,
) -> Result<()> {
    println!("\n--- [Plot] {} vs {} ---", y, x);
    let uploads = read_uploads(files)?;
    let combined = aggregate::combine(&uploads, config.mdot_scope)
        .context("Failed to combine runs")?;
    print_warnings(&combined.warnings);

    let series = aggregate::select_series(&combined.table, x, y, group_by_file)?;
    if series.iter().all(|s| s.points.is_empty()) {
        bail!("No rows with both '{}' and '{}' to plot", x, y);
    }
    let title = match chart {
        ChartKind::Bar => format!("Bar Chart: {} vs {}", y, x),
        _ => format!("Line Plot: {} vs {}", y, x),
    };
    plotting::plot_series(output, chart, &title, x, y, &series, &config.plot)?;
    println!("Chart saved to '{}'.", output.display());
    Ok(())
}

pub fn columns(files: &[PathBuf], config: &LabConfig) -> Result<()> {
    let uploads = read_uploads(files)?;
    let combined = aggregate::combine(&uploads, config.mdot_scope)
        .context("Failed to combine runs")?;
    print_warnings(&combined.warnings);

    let (x_options, y_options) = aggregate::axis_options(&combined.table);
    println!("X-axis variables:");
    for name in x_options {
        println!("  - {}", name);
    }
    println!("Y-axis variables:");
    for name in y_options {
        println!("  - {}", name);
    }
    Ok(())
}

fn read_uploads(files: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    files
        .iter()
        .map(|path| {
            UploadedFile::from_path(path).with_context(|| format!("Error loading {:?}", path))
        })
        .collect()
}

fn print_warnings(warnings: &[ComputationWarning]) {
    for warning in warnings {
        println!("Warning: {}", warning);
    }
}

/// Plain-text rendering of a small table, one row per line.
fn render_table(table: &Table) -> String {
    let mut out = table.column_names().join(" | ");
    out.push('\n');
    for row in 0..table.row_count() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.data.cell_text(row).unwrap_or_default())
            .collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out
}
