use crate::columns;
use serde::{Deserialize, Serialize};

/// Per-run constants that can be compared across runs with a confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PmEmissionFactor,
    TotalEnergy,
    AverageMdotFuel,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::PmEmissionFactor,
        Metric::TotalEnergy,
        Metric::AverageMdotFuel,
    ];

    /// The saved-file column holding this metric.
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::PmEmissionFactor => columns::PM_EF,
            Metric::TotalEnergy => columns::TOTAL_ENERGY,
            Metric::AverageMdotFuel => columns::AVERAGE_MDOT_FUEL,
        }
    }
}

/// One run's value of the selected metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub source_file: String,
    pub fuel_label: String,
    pub value: f64,
}

/// Grouped statistics for one fuel label.
///
/// `std`, `sem` and `ci95` are `None` when the group holds a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStat {
    pub fuel_label: String,
    pub mean: f64,
    pub std: Option<f64>,
    pub count: usize,
    pub sem: Option<f64>,
    pub ci95: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    ErrorBar,
}
