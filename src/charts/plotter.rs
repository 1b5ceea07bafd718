//! Chart Data Module
//! Plain data handed to the renderer, plus palette and axis helpers.

use plotters::style::RGBColor;

/// Color palette for series, in assignment order.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Color for the series at `index`.
pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Titles shared by every chart kind.
#[derive(Debug, Clone)]
pub struct ChartLabels {
    pub file_name: String,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
}

impl ChartLabels {
    pub fn new(file_name: &str, title: &str, x_desc: &str, y_desc: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            title: title.to_string(),
            x_desc: x_desc.to_string(),
            y_desc: y_desc.to_string(),
        }
    }
}

/// One bar per category.
#[derive(Debug, Clone)]
pub struct BarChartData {
    pub labels: ChartLabels,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

/// Several series side by side for each year.
#[derive(Debug, Clone)]
pub struct GroupedBarChartData {
    pub labels: ChartLabels,
    pub years: Vec<i64>,
    /// Series name and one value per entry of `years`.
    pub series: Vec<(String, Vec<f64>)>,
}

/// One box per group.
#[derive(Debug, Clone)]
pub struct BoxplotData {
    pub labels: ChartLabels,
    pub groups: Vec<(String, Vec<f64>)>,
}

/// Points on two numeric axes.
#[derive(Debug, Clone)]
pub struct ScatterData {
    pub labels: ChartLabels,
    pub points: Vec<(f64, f64)>,
}

/// Upper bound of a zero-based value axis with some headroom.
pub fn value_axis_max(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Padded (min, max) of finite values, or (0, 1) when there are none.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_infinite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

/// Horizontal extent of bar `series_index` of `series_count` around `center`.
///
/// The bars of one year share 80% of a unit-wide slot.
pub fn grouped_bar_span(center: f64, series_index: usize, series_count: usize) -> (f64, f64) {
    let slot = 0.8;
    let width = slot / series_count.max(1) as f64;
    let left = center - slot / 2.0 + series_index as f64 * width;
    (left, left + width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps() {
        let first = series_color(0);
        let wrapped = series_color(PALETTE.len());
        assert_eq!((first.0, first.1, first.2), (wrapped.0, wrapped.1, wrapped.2));
    }

    #[test]
    fn value_axis_has_headroom() {
        assert!((value_axis_max([1.0, 10.0, 5.0]) - 11.0).abs() < 1e-12);
        assert_eq!(value_axis_max([]), 1.0);
        assert_eq!(value_axis_max([f64::NAN, 0.0]), 1.0);
    }

    #[test]
    fn padded_range_handles_degenerate_input() {
        assert_eq!(padded_range([]), (0.0, 1.0));
        assert_eq!(padded_range([3.0, 3.0]), (2.0, 4.0));
        let (lo, hi) = padded_range([0.0, 100.0]);
        assert!(lo < 0.0 && hi > 100.0);
    }

    #[test]
    fn grouped_bars_tile_the_slot() {
        let spans: Vec<_> = (0..4).map(|i| grouped_bar_span(2012.0, i, 4)).collect();
        assert!((spans[0].0 - 2011.6).abs() < 1e-9);
        assert!((spans[3].1 - 2012.4).abs() < 1e-9);
        for pair in spans.windows(2) {
            assert!((pair[0].1 - pair[1].0).abs() < 1e-9);
        }
    }
}
