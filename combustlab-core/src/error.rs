use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Could not parse '{0}': {1}")]
    Parse(String, String),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("Failed to read spreadsheet '{0}': {1}")]
    Spreadsheet(String, #[source] calamine::Error),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("At least two valid files with consistent values are required (found {valid})")]
    InsufficientData {
        valid: usize,
        skipped: Vec<ComputationWarning>,
    },

    #[error("No valid data loaded from files")]
    NoValidData { skipped: Vec<ComputationWarning> },

    #[error("Statistics error: {0}")]
    Statistics(String),
}

/// A degraded step that did not stop the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationWarning {
    /// The fuel mass-loss rate could not be derived.
    MdotUnavailable { reason: String },
    /// Total energy was zero, so the PM emission factor is left blank.
    ZeroEnergy,
    EmptyFile { file: String },
    MetricColumnMissing { file: String, metric: String },
    MetricNotConstant {
        file: String,
        metric: String,
        distinct: usize,
    },
    FileSkipped { file: String, reason: String },
}

impl fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationWarning::MdotUnavailable { reason } => {
                write!(f, "Couldn't calculate mdot fuel: {}", reason)
            }
            ComputationWarning::ZeroEnergy => {
                write!(f, "Total energy is zero, PM EF can't be computed")
            }
            ComputationWarning::EmptyFile { file } => write!(f, "{}: File is empty, skipped", file),
            ComputationWarning::MetricColumnMissing { file, metric } => {
                write!(f, "{}: '{}' not found, skipped", file, metric)
            }
            ComputationWarning::MetricNotConstant {
                file,
                metric,
                distinct,
            } => write!(
                f,
                "{}: Must have exactly one unique value in '{}' (found {}), skipped",
                file, metric, distinct
            ),
            ComputationWarning::FileSkipped { file, reason } => {
                write!(f, "{}: Error processing file: {}", file, reason)
            }
        }
    }
}
