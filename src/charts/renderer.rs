//! Static Chart Renderer
//! Writes bar, grouped bar, boxplot and scatter charts as PNG files.
//!
//! Every chart uses the same layout: caption on top, axis descriptions on
//! the left and bottom, white background.

use crate::charts::plotter::{
    grouped_bar_span, padded_range, series_color, value_axis_max, BarChartData, BoxplotData,
    ChartLabels, GroupedBarChartData, ScatterData,
};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);
const LABEL_FONT: (&str, u32) = ("sans-serif", 11);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to draw {chart}: {message}")]
    Draw { chart: String, message: String },
    #[error("Nothing to plot for {0}")]
    Empty(String),
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

pub struct StaticChartRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl StaticChartRenderer {
    /// Renderer writing into `output_dir`, created if it does not exist.
    pub fn new(output_dir: &Path) -> Result<Self, ChartError> {
        fs::create_dir_all(output_dir).map_err(|source| ChartError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            size: (1200, 700),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve the file for `labels` and run `draw` against it.
    fn render<F>(&self, labels: &ChartLabels, kind: &str, draw: F) -> Result<PathBuf, ChartError>
    where
        F: FnOnce(&Path, (u32, u32)) -> DrawResult,
    {
        let path = self.output_dir.join(&labels.file_name);
        draw(&path, self.size).map_err(|e| ChartError::Draw {
            chart: labels.file_name.clone(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), kind, "wrote chart");
        Ok(path)
    }

    /// One bar per category, in the given order.
    pub fn bar_chart(&self, data: &BarChartData) -> Result<PathBuf, ChartError> {
        if data.categories.is_empty() {
            return Err(ChartError::Empty(data.labels.file_name.clone()));
        }
        self.render(&data.labels, "bar", |path, size| Self::draw_bars(path, size, data))
    }

    fn draw_bars(path: &Path, size: (u32, u32), data: &BarChartData) -> DrawResult {
        let labels = &data.labels;
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let n = data.categories.len();
        let y_max = value_axis_max(data.values.iter().copied());
        let mut chart = ChartBuilder::on(&root)
            .caption(&labels.title, CAPTION_FONT.into_font())
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)?;

        let category_label = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => data.categories.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&category_label)
            .x_desc(labels.x_desc.as_str())
            .y_desc(labels.y_desc.as_str())
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(series_color(0).filled())
                .margin(6)
                .data(
                    data.values
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| v.is_finite())
                        .map(|(i, v)| (i, *v)),
                ),
        )?;

        root.present()?;
        Ok(())
    }

    /// Bars for every series side by side within each year, with value labels.
    pub fn grouped_bar_chart(&self, data: &GroupedBarChartData) -> Result<PathBuf, ChartError> {
        if data.years.is_empty() || data.series.is_empty() {
            return Err(ChartError::Empty(data.labels.file_name.clone()));
        }
        self.render(&data.labels, "grouped bar", |path, size| {
            Self::draw_grouped_bars(path, size, data)
        })
    }

    fn draw_grouped_bars(path: &Path, size: (u32, u32), data: &GroupedBarChartData) -> DrawResult {
        let labels = &data.labels;
        let first = data.years.iter().copied().min().unwrap_or_default() as f64;
        let last = data.years.iter().copied().max().unwrap_or_default() as f64;

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let y_max = value_axis_max(data.series.iter().flat_map(|(_, v)| v.iter().copied()));
        let mut chart = ChartBuilder::on(&root)
            .caption(&labels.title, CAPTION_FONT.into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((first - 0.5)..(last + 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(data.years.len() + 1)
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .x_desc(labels.x_desc.as_str())
            .y_desc(labels.y_desc.as_str())
            .draw()?;

        let series_count = data.series.len();
        for (index, (name, values)) in data.series.iter().enumerate() {
            let color = series_color(index);
            let bars: Vec<(f64, f64, f64)> = data
                .years
                .iter()
                .zip(values)
                .filter(|(_, v)| **v > 0.0)
                .map(|(year, v)| {
                    let (x0, x1) = grouped_bar_span(*year as f64, index, series_count);
                    (x0, x1, *v)
                })
                .collect();

            chart
                .draw_series(
                    bars.iter()
                        .map(|&(x0, x1, v)| Rectangle::new([(x0, 0.0), (x1, v)], color.filled())),
                )?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

            chart.draw_series(bars.iter().map(|&(x0, _, v)| {
                Text::new(format!("{:.2}", v), (x0, v), LABEL_FONT.into_font())
            }))?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Box and whiskers per group; groups without values are skipped.
    pub fn boxplot(&self, data: &BoxplotData) -> Result<PathBuf, ChartError> {
        if data.groups.iter().all(|(_, v)| v.is_empty()) {
            return Err(ChartError::Empty(data.labels.file_name.clone()));
        }
        self.render(&data.labels, "boxplot", |path, size| {
            Self::draw_boxplot(path, size, data)
        })
    }

    fn draw_boxplot(path: &Path, size: (u32, u32), data: &BoxplotData) -> DrawResult {
        let labels = &data.labels;
        let groups: Vec<&(String, Vec<f64>)> =
            data.groups.iter().filter(|(_, v)| !v.is_empty()).collect();

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (lo, hi) = padded_range(groups.iter().flat_map(|(_, v)| v.iter().copied()));
        let n = groups.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(&labels.title, CAPTION_FONT.into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), (lo as f32)..(hi as f32))?;

        let group_label = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => groups.get(*i).map(|g| g.0.clone()).unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&group_label)
            .x_desc(labels.x_desc.as_str())
            .y_desc(labels.y_desc.as_str())
            .draw()?;

        chart.draw_series(groups.iter().enumerate().map(|(i, (_, values))| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i), &Quartiles::new(values))
                .width(40)
                .whisker_width(0.5)
                .style(series_color(i).stroke_width(2))
        }))?;

        root.present()?;
        Ok(())
    }

    /// Semi-transparent points on two numeric axes.
    pub fn scatter(&self, data: &ScatterData) -> Result<PathBuf, ChartError> {
        if data.points.is_empty() {
            return Err(ChartError::Empty(data.labels.file_name.clone()));
        }
        self.render(&data.labels, "scatter", |path, size| {
            Self::draw_scatter(path, size, data)
        })
    }

    fn draw_scatter(path: &Path, size: (u32, u32), data: &ScatterData) -> DrawResult {
        let labels = &data.labels;
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_lo, x_hi) = padded_range(data.points.iter().map(|p| p.0));
        let (y_lo, y_hi) = padded_range(data.points.iter().map(|p| p.1));
        let mut chart = ChartBuilder::on(&root)
            .caption(&labels.title, CAPTION_FONT.into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc(labels.x_desc.as_str())
            .y_desc(labels.y_desc.as_str())
            .draw()?;

        let color = series_color(0);
        chart.draw_series(
            data.points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, color.mix(0.5).filled())),
        )?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(name: &str) -> StaticChartRenderer {
        let dir = std::env::temp_dir().join("game_sales_eda_charts").join(name);
        StaticChartRenderer::new(&dir).unwrap()
    }

    /// Rendering needs a system font; a font-less host reports a draw error
    /// instead of producing a file.
    fn assert_rendered(result: Result<PathBuf, ChartError>) {
        match result {
            Ok(path) => assert!(path.is_file()),
            Err(ChartError::Draw { .. }) => {}
            Err(e) => panic!("unexpected chart error: {e}"),
        }
    }

    #[test]
    fn creates_output_directory() {
        let r = renderer("mkdir");
        assert!(r.output_dir().is_dir());
    }

    #[test]
    fn renders_bar_chart() {
        let r = renderer("bar");
        assert_rendered(r.bar_chart(&BarChartData {
            labels: ChartLabels::new("genres.png", "Sales by genre", "Genre", "Sales"),
            categories: vec!["Action".into(), "Shooter".into(), "Sports".into()],
            values: vec![30.5, 22.1, 18.0],
        }));
    }

    #[test]
    fn renders_grouped_bar_chart() {
        let r = renderer("grouped");
        assert_rendered(r.grouped_bar_chart(&GroupedBarChartData {
            labels: ChartLabels::new("platforms.png", "Sales by year", "Year", "Sales"),
            years: vec![2014, 2015, 2016],
            series: vec![
                ("PS4".into(), vec![100.0, 118.9, 69.3]),
                ("XOne".into(), vec![54.1, 60.1, 26.2]),
            ],
        }));
    }

    #[test]
    fn renders_boxplot_and_scatter() {
        let r = renderer("box_scatter");
        assert_rendered(r.boxplot(&BoxplotData {
            labels: ChartLabels::new("box.png", "Distribution", "Platform", "Sales"),
            groups: vec![
                ("PS4".into(), vec![0.1, 0.5, 1.2, 3.4, 14.6]),
                ("PC".into(), vec![]),
                ("3DS".into(), vec![0.2, 0.3, 0.9]),
            ],
        }));
        assert_rendered(r.scatter(&ScatterData {
            labels: ChartLabels::new("scatter.png", "Critic vs sales", "Critic", "Sales"),
            points: vec![(70.0, 0.5), (85.0, 2.1), (92.0, 7.3)],
        }));
    }

    #[test]
    fn empty_charts_are_rejected() {
        let r = renderer("empty");
        let err = r
            .bar_chart(&BarChartData {
                labels: ChartLabels::new("empty.png", "Empty", "x", "y"),
                categories: vec![],
                values: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, ChartError::Empty(_)));
        let err = r
            .boxplot(&BoxplotData {
                labels: ChartLabels::new("empty_box.png", "Empty", "x", "y"),
                groups: vec![("PC".into(), vec![])],
            })
            .unwrap_err();
        assert!(matches!(err, ChartError::Empty(_)));
    }
}
