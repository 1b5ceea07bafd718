//! Game Sales EDA - exploratory analysis of a video game sales dataset
//!
//! Loads the games CSV, cleans it once, then prints rankings, regional market
//! shares and hypothesis tests while writing the matching charts as PNG files.

mod analysis;
mod charts;
mod config;
mod data;
mod logging;
mod report;
mod stats;

use analysis::SalesAnalysis;
use anyhow::Context;
use charts::StaticChartRenderer;
use clap::Parser;
use config::AnalysisConfig;
use data::{DataLoader, DataProcessor};
use std::io::Write;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = AnalysisConfig::parse();
    logging::init_tracing(config.log_filter())?;

    let raw = DataLoader::new()
        .load_csv(&config.input)
        .with_context(|| format!("loading {}", config.input.display()))?;
    let table = DataProcessor::normalize(&raw).context("normalizing sales table")?;

    let charts = if config.no_charts {
        None
    } else {
        let renderer = StaticChartRenderer::new(&config.output_dir)?;
        info!(dir = %renderer.output_dir().display(), "writing charts");
        Some(renderer)
    };

    let stdout = std::io::stdout();
    let mut analysis = SalesAnalysis::new(&table, &config, charts, stdout.lock());
    analysis.run(raw.height())?;
    analysis.into_output().flush()?;

    info!("analysis complete");
    Ok(())
}
