//! Turns an instrument export into the canonical run table.

use crate::{
    error::ComputationWarning,
    table::{ColumnData, Table},
};
use combustlab_schemas::columns::{self, AVERAGE_MDOT_FUEL, ELAPSED_TIME, LOAD_CELL, MDOT_FUEL};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRun {
    pub table: Table,
    pub warnings: Vec<ComputationWarning>,
}

/// Renames instrument headers, then derives the fuel mass-loss rate and its mean.
///
/// A missing time or load-cell channel is not fatal: the run keeps its other columns and
/// the problem is reported as a warning.
pub fn normalize(mut table: Table) -> NormalizedRun {
    rename_instrument_columns(&mut table);

    let mut warnings = Vec::new();
    match add_mass_loss_rate(&mut table, &[0]) {
        Ok(()) => {
            let mean = table.numeric(MDOT_FUEL).and_then(mean_ignoring_missing);
            table.set_constant(AVERAGE_MDOT_FUEL, mean);
        }
        Err(reason) => {
            warn!("Couldn't calculate mdot fuel: {}", reason);
            warnings.push(ComputationWarning::MdotUnavailable { reason });
        }
    }
    NormalizedRun { table, warnings }
}

pub fn rename_instrument_columns(table: &mut Table) {
    table.rename_columns(columns::canonical_name);
}

/// Coerces the time and load-cell channels and stores their first-difference ratio as
/// `mdot fuel (kg/s)`.
///
/// `segment_starts` lists the rows where differencing restarts; each of those rows gets a
/// missing value. Passing `&[0]` differences the whole table as one series.
pub(crate) fn add_mass_loss_rate(
    table: &mut Table,
    segment_starts: &[usize],
) -> Result<(), String> {
    for name in [ELAPSED_TIME, LOAD_CELL] {
        if !table.coerce_numeric(name) {
            return Err(format!("column '{}' not found", name));
        }
    }
    let time = table.numeric(ELAPSED_TIME).unwrap_or_default();
    let load = table.numeric(LOAD_CELL).unwrap_or_default();

    let mut bounds: Vec<usize> = segment_starts
        .iter()
        .copied()
        .filter(|start| *start < table.row_count())
        .collect();
    bounds.push(table.row_count());

    let mut rate = Vec::with_capacity(table.row_count());
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        rate.extend(first_difference_rate(&load[start..end], &time[start..end]));
    }
    table.set_column(MDOT_FUEL, ColumnData::Numeric(rate));
    Ok(())
}

/// `(load[i] - load[i-1]) / (time[i] - time[i-1])`, with row 0 missing.
///
/// A missing neighbour or a zero time step gives a missing value.
pub fn first_difference_rate(load: &[Option<f64>], time: &[Option<f64>]) -> Vec<Option<f64>> {
    let len = load.len().min(time.len());
    (0..len)
        .map(|i| {
            if i == 0 {
                return None;
            }
            let dm = load[i]? - load[i - 1]?;
            let dt = time[i]? - time[i - 1]?;
            Some(dm / dt).filter(|rate| rate.is_finite())
        })
        .collect()
}

pub fn mean_ignoring_missing(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[[&str; 3]]) -> Table {
        Table::from_records(
            vec![
                "X_Value".to_string(),
                "1-Load Cell (Formula Result)".to_string(),
                "Comment".to_string(),
            ],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn renames_known_headers_and_keeps_the_rest() {
        let mut table = Table::from_records(
            vec!["X_Value".into(), "Unlisted".into(), "Comment".into()],
            vec![vec!["0".into(), "1".into(), "x".into()]],
        );
        rename_instrument_columns(&mut table);
        assert_eq!(table.column_names(), vec![ELAPSED_TIME, "Unlisted", "Time"]);
    }

    #[test]
    fn derivative_of_known_fixture() {
        let run = normalize(raw(&[["0", "10", ""], ["60", "9.5", ""], ["120", "9.0", ""]]));
        assert!(run.warnings.is_empty());

        let mdot = run.table.numeric(MDOT_FUEL).unwrap();
        assert_eq!(mdot[0], None);
        assert!((mdot[1].unwrap() - (-1.0 / 120.0)).abs() < 1e-12);
        assert!((mdot[2].unwrap() - (-1.0 / 120.0)).abs() < 1e-12);

        let avg = run.table.numeric(AVERAGE_MDOT_FUEL).unwrap();
        assert_eq!(avg.len(), 3);
        assert!(avg.iter().all(|v| (v.unwrap() + 1.0 / 120.0).abs() < 1e-12));
    }

    #[test]
    fn non_numeric_cells_become_missing_not_errors() {
        let run = normalize(raw(&[["0", "10", ""], ["n/a", "9.5", ""], ["120", "9.0", ""]]));
        assert!(run.warnings.is_empty());
        let mdot = run.table.numeric(MDOT_FUEL).unwrap();
        assert_eq!(mdot, &[None, None, None][..]);
        assert_eq!(run.table.numeric(AVERAGE_MDOT_FUEL).unwrap(), &[None, None, None][..]);
    }

    #[test]
    fn missing_load_cell_is_a_warning() {
        let table = Table::from_records(
            vec!["X_Value".into(), "other".into()],
            vec![vec!["0".into(), "1".into()], vec!["60".into(), "2".into()]],
        );
        let run = normalize(table);
        assert_eq!(run.warnings.len(), 1);
        assert!(matches!(run.warnings[0], ComputationWarning::MdotUnavailable { .. }));
        assert!(!run.table.has_column(MDOT_FUEL));
        assert!(!run.table.has_column(AVERAGE_MDOT_FUEL));
        assert!(run.table.has_column(ELAPSED_TIME));
    }

    #[test]
    fn zero_time_step_is_missing() {
        let rate = first_difference_rate(
            &[Some(10.0), Some(9.0), Some(8.0)],
            &[Some(0.0), Some(0.0), Some(10.0)],
        );
        assert_eq!(rate, vec![None, None, Some(-0.1)]);
    }

    #[test]
    fn segments_restart_the_difference() {
        let mut table = Table::from_records(
            vec![ELAPSED_TIME.into(), LOAD_CELL.into()],
            vec![
                vec!["0".into(), "10".into()],
                vec!["10".into(), "9".into()],
                vec!["0".into(), "5".into()],
                vec!["10".into(), "4".into()],
            ],
        );
        add_mass_loss_rate(&mut table, &[0, 2]).unwrap();
        assert_eq!(
            table.numeric(MDOT_FUEL).unwrap(),
            &[None, Some(-0.1), None, Some(-0.1)][..]
        );
    }

    #[test]
    fn mean_skips_missing() {
        assert_eq!(mean_ignoring_missing(&[None, Some(1.0), Some(3.0)]), Some(2.0));
        assert_eq!(mean_ignoring_missing(&[None, None]), None);
    }
}
