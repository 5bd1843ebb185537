//! Cross-run views: confidence-interval summaries of per-run metrics and the combined
//! time-series table used for line and bar charts.

use crate::{
    error::{ComputationWarning, LabError},
    loader,
    normalize::add_mass_loss_rate,
    table::{ColumnData, Table},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use combustlab_schemas::{
    columns::{APPLIANCE, ELAPSED_TIME, FUEL_TYPE, LOAD_CELL, SOURCE_FILE},
    file_formats::MdotScope,
    summary::{Metric, MetricSample, SummaryStat},
};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::warn;

/// A result file handed to the aggregator, identified by its bare file name.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl UploadedFile {
    pub fn from_path(path: &Path) -> Result<Self, LabError> {
        let contents =
            fs::read(path).map_err(|e| LabError::FileIO(path.display().to_string(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, contents })
    }
}

/// Metadata carried in a saved run's file name, `{DDMMYYYY}-{fuel}-{appliance}-...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFileName {
    Parsed {
        date: String,
        fuel: String,
        appliance: Option<String>,
    },
    Unparseable,
}

impl RunFileName {
    /// Finds the first eight-digit date followed by `-`, then takes the next one or two
    /// `-`-terminated tokens. Never fails; a name without the pattern is `Unparseable`.
    pub fn parse(name: &str) -> Self {
        let fuel_match = scan_tokens(name, 1);
        let Some((date, tokens)) = fuel_match else {
            return RunFileName::Unparseable;
        };
        let appliance = scan_tokens(name, 2).map(|(_, mut tokens)| tokens.remove(1));
        RunFileName::Parsed {
            date,
            fuel: tokens[0].clone(),
            appliance,
        }
    }

    pub fn fuel_label(&self) -> Option<String> {
        match self {
            RunFileName::Parsed { fuel, .. } => Some(display_label(fuel)),
            RunFileName::Unparseable => None,
        }
    }

    pub fn appliance_label(&self) -> Option<String> {
        match self {
            RunFileName::Parsed { appliance, .. } => appliance.as_deref().map(display_label),
            RunFileName::Unparseable => None,
        }
    }
}

/// Scans for `\d{8}-` followed by `count` dash-terminated tokens (shortest match).
fn scan_tokens(name: &str, count: usize) -> Option<(String, Vec<String>)> {
    let bytes = name.as_bytes();
    for start in 0..bytes.len() {
        let date_end = start + 8;
        if date_end >= bytes.len()
            || !bytes[start..date_end].iter().all(u8::is_ascii_digit)
            || bytes[date_end] != b'-'
        {
            continue;
        }
        let mut rest = &name[date_end + 1..];
        let mut tokens = Vec::with_capacity(count);
        while tokens.len() < count {
            match rest.find('-') {
                Some(idx) => {
                    tokens.push(rest[..idx].to_string());
                    rest = &rest[idx + 1..];
                }
                None => break,
            }
        }
        if tokens.len() == count {
            return Some((name[start..date_end].to_string(), tokens));
        }
    }
    None
}

/// Underscores to spaces, then title case.
pub fn display_label(token: &str) -> String {
    title_case(&token.replace('_', " "))
}

/// Uppercases the first letter of every run of letters and lowercases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// Fuel label from the second `-`-separated token of a result file name.
pub fn fuel_label_from_name(name: &str) -> Option<String> {
    name.split('-').nth(1).map(display_label)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub metric: Metric,
    pub samples: Vec<MetricSample>,
    pub stats: Vec<SummaryStat>,
    pub warnings: Vec<ComputationWarning>,
}

/// Collects one value of `metric` per file and summarises them by fuel label.
///
/// Files without the metric column, or whose column holds anything other than exactly one
/// distinct number, are skipped with a warning.
///
/// # Errors
///
/// `LabError::InsufficientData` when fewer than two files yield a value.
pub fn summarize(files: &[UploadedFile], metric: Metric) -> Result<MetricSummary, LabError> {
    let metric_name = metric.column_name();
    let mut samples = Vec::new();
    let mut warnings = Vec::new();

    for file in files {
        match extract_sample(file, metric_name) {
            Ok(sample) => samples.push(sample),
            Err(warning) => {
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    if samples.len() < 2 {
        return Err(LabError::InsufficientData {
            valid: samples.len(),
            skipped: warnings,
        });
    }

    let stats = summary_statistics(&samples)?;
    Ok(MetricSummary {
        metric,
        samples,
        stats,
        warnings,
    })
}

fn extract_sample(file: &UploadedFile, metric_name: &str) -> Result<MetricSample, ComputationWarning> {
    let skipped = |reason: String| ComputationWarning::FileSkipped {
        file: file.name.clone(),
        reason,
    };
    let mut table =
        loader::read_delimited(&file.name, &file.contents).map_err(|e| skipped(e.to_string()))?;
    table.strip_column_names();

    if !table.coerce_numeric(metric_name) {
        return Err(ComputationWarning::MetricColumnMissing {
            file: file.name.clone(),
            metric: metric_name.to_string(),
        });
    }
    let mut distinct: Vec<f64> = Vec::new();
    for value in table.numeric(metric_name).unwrap_or_default().iter().flatten() {
        if !distinct.contains(value) {
            distinct.push(*value);
        }
    }
    if distinct.len() != 1 {
        return Err(ComputationWarning::MetricNotConstant {
            file: file.name.clone(),
            metric: metric_name.to_string(),
            distinct: distinct.len(),
        });
    }

    let fuel_label = fuel_label_from_name(&file.name)
        .ok_or_else(|| skipped("file name has no fuel token".to_string()))?;
    Ok(MetricSample {
        source_file: file.name.clone(),
        fuel_label,
        value: distinct[0],
    })
}

/// Mean, sample standard deviation, standard error and 95% confidence half-width per fuel.
///
/// Groups are ordered by label. A single-sample group has no spread, so its `std`, `sem`
/// and `ci95` are `None`.
pub fn summary_statistics(samples: &[MetricSample]) -> Result<Vec<SummaryStat>, LabError> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(sample.fuel_label.as_str())
            .or_default()
            .push(sample.value);
    }

    groups
        .into_iter()
        .map(|(label, values)| {
            let count = values.len();
            let mean = values.iter().sum::<f64>() / count as f64;
            let std = sample_std(&values, mean);
            let sem = std.map(|s| s / (count as f64).sqrt());
            let ci95 = match sem {
                Some(sem) => Some(sem * t_quantile_975(count - 1)?),
                None => None,
            };
            Ok(SummaryStat {
                fuel_label: label.to_string(),
                mean,
                std,
                count,
                sem,
                ci95,
            })
        })
        .collect()
}

/// Sample standard deviation (n - 1 denominator), the estimator the Student-t interval
/// expects. The population (n) form would understate the spread of two or three runs.
fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Two-sided 95% Student-t critical value for `dof` degrees of freedom.
pub fn t_quantile_975(dof: usize) -> Result<f64, LabError> {
    let dist = StudentsT::new(0.0, 1.0, dof as f64)
        .map_err(|e| LabError::Statistics(e.to_string()))?;
    Ok(dist.inverse_cdf(0.975))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRuns {
    pub table: Table,
    pub warnings: Vec<ComputationWarning>,
}

/// Stacks several saved runs into one table tagged with `Source File`.
///
/// `fuel_type` and `appliance` are filled from the file names when the runs do not carry
/// them. If the time and load-cell channels exist, `mdot fuel (kg/s)` is recomputed over
/// the stacked rows. With `MdotScope::Concatenated` the first row of every file after the
/// first is differenced against the last row of the previous file, so that row's rate
/// mixes two runs; `MdotScope::PerFile` leaves it missing instead.
pub fn combine(files: &[UploadedFile], scope: MdotScope) -> Result<CombinedRuns, LabError> {
    let mut tables = Vec::new();
    let mut warnings = Vec::new();

    for file in files {
        if file.contents.is_empty() {
            let warning = ComputationWarning::EmptyFile {
                file: file.name.clone(),
            };
            warn!("{}", warning);
            warnings.push(warning);
            continue;
        }
        match loader::read_delimited(&file.name, &file.contents) {
            Ok(mut table) => {
                table.set_constant_text(SOURCE_FILE, &file.name);
                table.convert_numeric_where_possible();
                tables.push(table);
            }
            Err(e) => {
                let warning = ComputationWarning::FileSkipped {
                    file: file.name.clone(),
                    reason: e.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    if tables.is_empty() {
        return Err(LabError::NoValidData { skipped: warnings });
    }

    let mut segment_starts = Vec::with_capacity(tables.len());
    let mut offset = 0;
    for table in &tables {
        segment_starts.push(offset);
        offset += table.row_count();
    }

    let mut combined = Table::concat(tables);
    add_filename_fields(&mut combined);

    if combined.has_column(ELAPSED_TIME) && combined.has_column(LOAD_CELL) {
        let starts = match scope {
            MdotScope::Concatenated => vec![0],
            MdotScope::PerFile => segment_starts,
        };
        if let Err(reason) = add_mass_loss_rate(&mut combined, &starts) {
            let warning = ComputationWarning::MdotUnavailable { reason };
            warn!("{}", warning);
            warnings.push(warning);
        }
    }

    Ok(CombinedRuns {
        table: combined,
        warnings,
    })
}

fn add_filename_fields(table: &mut Table) {
    let parsed: Vec<Option<RunFileName>> = match table.column(SOURCE_FILE) {
        Some(column) => (0..table.row_count())
            .map(|row| column.data.cell_text(row).map(|name| RunFileName::parse(&name)))
            .collect(),
        None => return,
    };
    if !table.has_column(FUEL_TYPE) {
        let values = parsed
            .iter()
            .map(|p| p.as_ref().and_then(RunFileName::fuel_label))
            .collect();
        table.set_column(FUEL_TYPE, ColumnData::Text(values));
    }
    if !table.has_column(APPLIANCE) {
        let values = parsed
            .iter()
            .map(|p| p.as_ref().and_then(RunFileName::appliance_label))
            .collect();
        table.set_column(APPLIANCE, ColumnData::Text(values));
    }
}

/// Column choices for the chart axes: every combined column for Y; the same plus the
/// derived `fuel_type` and `appliance` fields, sorted, for X.
pub fn axis_options(table: &Table) -> (Vec<String>, Vec<String>) {
    let y: Vec<String> = table.column_names().iter().map(|n| n.to_string()).collect();
    let mut x = y.clone();
    x.push(FUEL_TYPE.to_string());
    x.push(APPLIANCE.to_string());
    x.sort();
    x.dedup();
    (x, y)
}

#[derive(Debug, Clone, PartialEq)]
pub enum XValue {
    Number(f64),
    Timestamp(NaiveDateTime),
    Category(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    /// Source file name when grouped by file, otherwise the Y column name.
    pub name: String,
    pub points: Vec<(XValue, f64)>,
}

/// Builds chart series from the combined table.
///
/// Y is coerced to numbers. Rows with a missing X or Y are dropped. An X column named
/// `time` (any case) is parsed as timestamps and rows that fail to parse are dropped too.
pub fn select_series(
    table: &Table,
    x: &str,
    y: &str,
    group_by_file: bool,
) -> Result<Vec<PlotSeries>, LabError> {
    let x_column = table
        .column(x)
        .ok_or_else(|| LabError::Validation(format!("Unknown X-axis column '{}'", x)))?;
    let mut y_table = Table::new();
    let y_column = table
        .column(y)
        .ok_or_else(|| LabError::Validation(format!("Unknown Y-axis column '{}'", y)))?;
    y_table.set_column(y, y_column.data.clone());
    y_table.coerce_numeric(y);
    let y_values = y_table.numeric(y).unwrap_or_default();
    let is_time = x.eq_ignore_ascii_case("time");
    let source = table.column(SOURCE_FILE);

    let mut series: Vec<PlotSeries> = Vec::new();
    for row in 0..table.row_count() {
        let Some(y_value) = y_values.get(row).copied().flatten() else {
            continue;
        };
        let x_value = match &x_column.data {
            ColumnData::Numeric(values) => match values[row] {
                Some(v) if is_time => match timestamp_from_number(v) {
                    Some(ts) => XValue::Timestamp(ts),
                    None => continue,
                },
                Some(v) => XValue::Number(v),
                None => continue,
            },
            ColumnData::Text(values) => match &values[row] {
                Some(text) if is_time => match parse_timestamp(text) {
                    Some(ts) => XValue::Timestamp(ts),
                    None => continue,
                },
                Some(text) => XValue::Category(text.clone()),
                None => continue,
            },
        };

        let name = if group_by_file {
            source
                .and_then(|c| c.data.cell_text(row))
                .unwrap_or_default()
        } else {
            y.to_string()
        };
        match series.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.points.push((x_value, y_value)),
            None => series.push(PlotSeries {
                name,
                points: vec![(x_value, y_value)],
            }),
        }
    }
    Ok(series)
}

const TIMESTAMP_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses the timestamp layouts seen in instrument exports. A bare time of day is placed
/// on 1970-01-01 so runs recorded on different days share one axis.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_local());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"].iter().find_map(|format| {
        NaiveTime::parse_from_str(text, format)
            .ok()
            .map(|time| NaiveDate::default().and_time(time))
    })
}

/// Numeric time values are taken as seconds since the Unix epoch. Values outside the
/// representable range have no timestamp.
fn timestamp_from_number(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    chrono::DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}
