//! Renders run comparisons to PNG files.

use anyhow::Result;
use combustlab_core::aggregate::{MetricSummary, PlotSeries, XValue};
use combustlab_schemas::{file_formats::PlotSettings, summary::ChartKind};
use plotters::prelude::*;
use std::path::Path;

const COLORS: [RGBColor; 6] = [RED, GREEN, BLUE, YELLOW, CYAN, MAGENTA];

/// How X values are laid out on the horizontal axis.
enum XAxis {
    Numeric,
    /// Seconds since the Unix epoch.
    Time,
    /// Category index; the label is looked up by position.
    Categorical(Vec<String>),
}

impl XAxis {
    fn label(&self, position: f64) -> String {
        match self {
            XAxis::Numeric => format!("{}", position),
            XAxis::Time => chrono::DateTime::from_timestamp(position as i64, 0)
                .map(|dt| dt.format("%H:%M:%S").to_string())
                .unwrap_or_default(),
            XAxis::Categorical(categories) => {
                let idx = position.round();
                if (position - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                categories.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

type Projected = (String, Vec<(f64, f64)>);

/// Maps every series onto one shared f64 axis.
///
/// All-numeric or all-timestamp X values keep their scale; anything else is treated as
/// categories in order of first appearance.
fn project(series: &[PlotSeries]) -> (XAxis, Vec<Projected>) {
    let values = || series.iter().flat_map(|s| s.points.iter().map(|(x, _)| x));
    let all_numeric = values().all(|x| matches!(x, XValue::Number(_)));
    let all_time = values().all(|x| matches!(x, XValue::Timestamp(_)));

    let axis = if all_numeric {
        XAxis::Numeric
    } else if all_time {
        XAxis::Time
    } else {
        let mut categories: Vec<String> = Vec::new();
        for x in values() {
            let text = x_text(x);
            if !categories.contains(&text) {
                categories.push(text);
            }
        }
        XAxis::Categorical(categories)
    };

    let projected = series
        .iter()
        .map(|s| {
            let points = s
                .points
                .iter()
                .map(|(x, y)| {
                    let position = match (&axis, x) {
                        (XAxis::Categorical(categories), x) => {
                            let text = x_text(x);
                            categories.iter().position(|c| *c == text).unwrap_or(0) as f64
                        }
                        (_, XValue::Number(v)) => *v,
                        (_, XValue::Timestamp(ts)) => ts.and_utc().timestamp_millis() as f64 / 1000.0,
                        (_, XValue::Category(_)) => 0.0,
                    };
                    (position, *y)
                })
                .collect();
            (s.name.clone(), points)
        })
        .collect();
    (axis, projected)
}

fn x_text(x: &XValue) -> String {
    match x {
        XValue::Number(v) => format!("{}", v),
        XValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        XValue::Category(text) => text.clone(),
    }
}

/// Padded (min, max) of an iterator, never empty.
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Line or bar chart of Y against X, one colour per series.
pub fn plot_series(
    path: &Path,
    chart_kind: ChartKind,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[PlotSeries],
    settings: &PlotSettings,
) -> Result<()> {
    println!("[Plotting] Generating {} series...", series.len());
    let (axis, projected) = project(series);
    let is_bar = chart_kind == ChartKind::Bar;

    let (mut x_min, mut x_max) = padded_range(
        projected.iter().flat_map(|(_, p)| p.iter().map(|(x, _)| *x)),
        false,
    );
    if is_bar || matches!(axis, XAxis::Categorical(_)) {
        x_min -= 0.5;
        x_max += 0.5;
    }
    let (y_min, y_max) = padded_range(
        projected.iter().flat_map(|(_, p)| p.iter().map(|(_, y)| *y)),
        is_bar,
    );

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let formatter = |v: &f64| axis.label(*v);
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&formatter)
        .draw()?;

    let bar_width = bar_width(&projected);
    let series_count = projected.len().max(1) as f64;

    for (i, (name, points)) in projected.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        let anno = if is_bar {
            let slot = bar_width / series_count;
            let offset = -bar_width / 2.0 + slot * i as f64;
            chart.draw_series(points.iter().map(move |(x, y)| {
                Rectangle::new([(x + offset, 0.0), (x + offset + slot, *y)], color.filled())
            }))?
        } else {
            chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
        };
        anno.label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// 80% of the smallest gap between distinct X positions.
fn bar_width(projected: &[Projected]) -> f64 {
    let mut xs: Vec<f64> = projected
        .iter()
        .flat_map(|(_, p)| p.iter().map(|(x, _)| *x))
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();
    let gap = xs
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);
    if gap.is_finite() && gap > 0.0 {
        gap * 0.8
    } else {
        0.8
    }
}

/// Bar chart of each fuel's mean with 95% confidence whiskers.
pub fn plot_error_bars(path: &Path, summary: &MetricSummary, settings: &PlotSettings) -> Result<()> {
    println!("[Plotting] Generating error bar chart...");
    let metric = summary.metric.column_name();
    let categories: Vec<String> = summary.stats.iter().map(|s| s.fuel_label.clone()).collect();
    let axis = XAxis::Categorical(categories);

    let (y_min, y_max) = padded_range(
        summary.stats.iter().flat_map(|s| {
            let ci = s.ci95.unwrap_or(0.0);
            [s.mean - ci, s.mean + ci]
        }),
        true,
    );

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} by Fuel Type (95% CI)", metric),
            ("sans-serif", 30).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(summary.stats.len() as f64 - 0.5), y_min..y_max)?;

    let formatter = |v: &f64| axis.label(*v);
    chart
        .configure_mesh()
        .x_desc("Fuel Type")
        .y_desc(format!("{} (mean)", metric))
        .x_labels(summary.stats.len().max(1))
        .x_label_formatter(&formatter)
        .draw()?;

    chart.draw_series(summary.stats.iter().enumerate().map(|(i, stat)| {
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, stat.mean)], BLUE.mix(0.6).filled())
    }))?;

    chart.draw_series(summary.stats.iter().enumerate().filter_map(|(i, stat)| {
        stat.ci95.map(|ci| {
            ErrorBar::new_vertical(
                i as f64,
                stat.mean - ci,
                stat.mean,
                stat.mean + ci,
                BLACK.stroke_width(2),
                12,
            )
        })
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(name: &str, points: Vec<(XValue, f64)>) -> PlotSeries {
        PlotSeries {
            name: name.to_string(),
            points,
        }
    }

    #[test]
    fn categories_share_positions_across_series() {
        let input = vec![
            series("a", vec![(XValue::Category("Wood".into()), 1.0)]),
            series(
                "b",
                vec![
                    (XValue::Category("Sod".into()), 2.0),
                    (XValue::Category("Wood".into()), 3.0),
                ],
            ),
        ];
        let (axis, projected) = project(&input);
        assert_eq!(projected[0].1, vec![(0.0, 1.0)]);
        assert_eq!(projected[1].1, vec![(1.0, 2.0), (0.0, 3.0)]);
        assert_eq!(axis.label(1.0), "Sod");
        assert_eq!(axis.label(0.5), "");
    }

    #[test]
    fn timestamps_become_epoch_seconds() {
        let ts = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 1, 30)
            .unwrap();
        let (axis, projected) = project(&[series("a", vec![(XValue::Timestamp(ts), 4.0)])]);
        assert_eq!(projected[0].1, vec![(90.0, 4.0)]);
        assert_eq!(axis.label(90.0), "00:01:30");
    }

    #[test]
    fn degenerate_ranges_are_widened() {
        let (lo, hi) = padded_range([2.0].into_iter(), false);
        assert!(lo < 2.0 && hi > 2.0);
        assert_eq!(padded_range(std::iter::empty(), true), (0.0, 1.0));
    }

    #[test]
    fn bar_width_follows_spacing() {
        let projected = vec![("a".to_string(), vec![(0.0, 1.0), (60.0, 2.0), (120.0, 3.0)])];
        assert!((bar_width(&projected) - 48.0).abs() < 1e-12);
    }
}
