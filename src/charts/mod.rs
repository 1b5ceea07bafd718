//! Charts module - static PNG chart rendering

mod plotter;
mod renderer;

pub use plotter::{BarChartData, BoxplotData, ChartLabels, GroupedBarChartData, ScatterData};
pub use renderer::{ChartError, StaticChartRenderer};
