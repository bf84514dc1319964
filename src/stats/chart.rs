//! Shapes app statistics into bar chart data.

use crate::api::StatPoint;
use crate::html::escape_html;
use crate::theme::ChartColors;

use chrono::NaiveDate;
use serde::Serialize;

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 150.0;
const CHART_PADDING: f64 = 50.0;

/// Largest `total_count` among `points`, or 0 when there are none.
pub fn reference_max(points: &[StatPoint]) -> u64 {
    points.iter().map(|p| p.total_count).max().unwrap_or(0)
}

/// One time bucket of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub test_day: NaiveDate,
    pub total_count: u64,
    /// Height of the background bar, shared by every bucket.
    pub reference: u64,
    pub label: String,
}

/// Bar chart of measurement counts per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppChart {
    pub y_max: u64,
    pub bars: Vec<ChartBar>,
}

impl AppChart {
    pub fn from_points(points: &[StatPoint]) -> Self {
        let y_max = reference_max(points);
        let bars = points
            .iter()
            .map(|p| ChartBar {
                test_day: p.test_day,
                total_count: p.total_count,
                reference: y_max,
                label: bar_label(p),
            })
            .collect();

        Self { y_max, bars }
    }

    /// Render as a standalone SVG document.
    ///
    /// Each bucket gets a full-height background bar and a value bar on top,
    /// the value bar carrying the tooltip label.
    pub fn to_svg(&self, colors: &ChartColors) -> String {
        let plot_width = CHART_WIDTH - 2.0 * CHART_PADDING;
        let plot_height = CHART_HEIGHT - 2.0 * CHART_PADDING;
        let baseline = CHART_PADDING + plot_height;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = CHART_WIDTH,
            h = CHART_HEIGHT
        );

        if !self.bars.is_empty() {
            let band = plot_width / self.bars.len() as f64;
            let bar_width = (band * 0.6).max(1.0);

            for (i, bar) in self.bars.iter().enumerate() {
                let x = CHART_PADDING + band * i as f64 + (band - bar_width) / 2.0;
                let reference_height = self.scale(bar.reference, plot_height);
                let value_height = self.scale(bar.total_count, plot_height);

                svg.push_str(&format!(
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
                    x,
                    baseline - reference_height,
                    bar_width,
                    reference_height,
                    colors.reference
                ));
                svg.push_str(&format!(
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"><title>{}</title></rect>"#,
                    x,
                    baseline - value_height,
                    bar_width,
                    value_height,
                    colors.value,
                    escape_html(&bar.label)
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }

    fn scale(&self, value: u64, plot_height: f64) -> f64 {
        if self.y_max == 0 {
            0.0
        } else {
            value as f64 / self.y_max as f64 * plot_height
        }
    }
}

fn bar_label(point: &StatPoint) -> String {
    format!(
        "{}\n{} Total",
        point.test_day.format("%-m/%-d/%Y"),
        point.total_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: &str, total_count: u64) -> StatPoint {
        StatPoint {
            test_day: day.parse().unwrap(),
            total_count,
        }
    }

    #[test]
    fn test_reference_max() {
        let points = vec![point("2020-01-01", 5), point("2020-01-02", 12)];
        assert_eq!(reference_max(&points), 12);
        assert_eq!(reference_max(&[]), 0);

        let ties = vec![point("2020-01-01", 3), point("2020-01-02", 3), point("2020-01-03", 0)];
        assert_eq!(reference_max(&ties), 3);
    }

    #[test]
    fn test_reference_max_is_true_max() {
        // Deterministic pseudo-random series of varying length.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for len in 0..50 {
            let points: Vec<StatPoint> = (0..len)
                .map(|i| {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    StatPoint {
                        test_day: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
                            + chrono::Duration::days(i),
                        total_count: seed % 10_000,
                    }
                })
                .collect();
            let expected = points.iter().map(|p| p.total_count).fold(0, u64::max);
            assert_eq!(reference_max(&points), expected);
        }
    }

    #[test]
    fn test_chart_bars() {
        let chart = AppChart::from_points(&[point("2020-01-01", 5), point("2020-01-02", 12)]);
        assert_eq!(chart.y_max, 12);
        assert_eq!(chart.bars.len(), 2);
        assert!(chart.bars.iter().all(|b| b.reference == 12));
        assert_eq!(chart.bars[0].label, "1/1/2020\n5 Total");
        assert_eq!(chart.bars[1].total_count, 12);
    }

    #[test]
    fn test_svg_rendering() {
        let colors = ChartColors::default();
        let chart = AppChart::from_points(&[point("2020-01-01", 5), point("2020-01-02", 10)]);
        let svg = chart.to_svg(&colors);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(&format!("fill=\"{}\"", colors.reference)).count(), 2);
        assert_eq!(svg.matches(&format!("fill=\"{}\"", colors.value)).count(), 2);
        assert!(svg.contains("<title>1/2/2020\n10 Total</title>"));
        // Full-height value bar equals the plot height.
        assert!(svg.contains(r#"height="50.00" fill=""#));
    }

    #[test]
    fn test_svg_empty_and_zero() {
        let colors = ChartColors::default();
        let empty = AppChart::from_points(&[]).to_svg(&colors);
        assert!(!empty.contains("<rect"));

        let zero = AppChart::from_points(&[point("2020-01-01", 0)]).to_svg(&colors);
        assert!(zero.contains(r#"height="0.00""#));
        assert!(!zero.contains("NaN"));
    }
}
