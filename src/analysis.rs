//! Sales Analysis Pipeline
//! Runs every analysis step, in a fixed order, against the cleaned table.
//!
//! Each step derives its own filtered view; the cleaned table itself is only
//! ever borrowed.

use crate::charts::{
    BarChartData, BoxplotData, ChartError, ChartLabels, GroupedBarChartData, ScatterData,
    StaticChartRenderer,
};
use crate::config::{
    AnalysisConfig, YearRange, CORRELATION_PLATFORM, CURRENT_WINDOW, LAPSOS, RECENT_WINDOW,
    RELEVANT_WINDOW, REPORTED_REGIONS, SCENARIOS, UNKNOWN_RATING,
};
use crate::data::DataProcessor;
use crate::report::{GameRow, LapsoSummary, Report};
use crate::stats::{AggOp, AggregateRequest, RankedTable, SalesAggregator, StatsCalculator};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

/// The `n` best-selling rows; rows without `total_sales` are not ranked.
pub fn top_games(df: &DataFrame, n: usize) -> Result<Vec<GameRow>> {
    let top = df
        .clone()
        .lazy()
        .filter(col("total_sales").is_not_null())
        .sort(
            ["total_sales"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(n as IdxSize)
        .collect()?;

    let names = top.column("name")?.str()?;
    let platforms = top.column("platform")?.str()?;
    let years = top.column("year_of_release")?.i64()?;
    let sales = top.column("total_sales")?.f64()?;

    Ok((0..top.height())
        .map(|i| GameRow {
            name: names.get(i).unwrap_or_default().to_string(),
            platform: platforms.get(i).unwrap_or_default().to_string(),
            year: years.get(i),
            total_sales: sales.get(i).unwrap_or(f64::NAN),
        })
        .collect())
}

/// Summed `value_column` per release year, ordered by year.
pub fn sum_by_year(df: &DataFrame, value_column: &str) -> Result<Vec<(i64, f64)>> {
    let table = SalesAggregator::aggregate(
        df,
        &AggregateRequest {
            group_column: "year_of_release",
            value_columns: &[value_column],
            op: AggOp::Sum,
            k: None,
            with_share: false,
        },
    )?;
    let mut by_year: Vec<(i64, f64)> = table
        .rows
        .iter()
        .filter_map(|r| Some((r.group.parse::<i64>().ok()?, r.values[0])))
        .collect();
    by_year.sort_by_key(|(year, _)| *year);
    Ok(by_year)
}

/// Pearson correlation of two columns over rows where both are present.
pub fn pearson_corr(df: &DataFrame, column_a: &str, column_b: &str) -> Result<Option<f64>> {
    let pairs = DataProcessor::f64_pairs(df, column_a, column_b)?;
    Ok(StatsCalculator::pearson_corr(&pairs))
}

/// Runs the fixed sequence of analysis steps.
pub struct SalesAnalysis<'a, W: Write> {
    table: &'a DataFrame,
    config: &'a AnalysisConfig,
    charts: Option<StaticChartRenderer>,
    report: Report<W>,
}

impl<'a, W: Write> SalesAnalysis<'a, W> {
    pub fn new(
        table: &'a DataFrame,
        config: &'a AnalysisConfig,
        charts: Option<StaticChartRenderer>,
        out: W,
    ) -> Self {
        Self {
            table,
            config,
            charts,
            report: Report::new(out),
        }
    }

    pub fn into_output(self) -> W {
        self.report.into_inner()
    }

    /// Overview of the cleaned table, then every step in order.
    pub fn run(&mut self, raw_rows: usize) -> Result<()> {
        self.overview(raw_rows).context("dataset overview")?;
        self.sales_by_year().context("sales by release year")?;
        self.top_games_overall().context("top games")?;
        self.platform_evolution().context("platform evolution")?;
        self.lapso_summary().context("lapso summary")?;
        self.platform_distribution().context("platform distribution")?;
        self.critic_vs_sales().context("critic score vs sales")?;
        self.genre_sales().context("genre sales")?;
        self.regional_tops("platform", "Platforms")
            .context("regional platform shares")?;
        self.regional_tops("genre", "Genres")
            .context("regional genre shares")?;
        self.rating_profile().context("rating profile")?;
        self.hypothesis_tests().context("hypothesis tests")?;
        Ok(())
    }

    /// Render a chart when charts are enabled; a failed chart is logged, not fatal.
    fn chart<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&StaticChartRenderer) -> Result<PathBuf, ChartError>,
    {
        let Some(renderer) = &self.charts else {
            return Ok(());
        };
        match draw(renderer) {
            Ok(path) => self.report.line(&format!("Chart: {}", path.display()))?,
            Err(e) => warn!(error = %e, "chart skipped"),
        }
        Ok(())
    }

    fn overview(&mut self, raw_rows: usize) -> Result<()> {
        self.report.section("Dataset overview")?;
        let columns = DataProcessor::column_summary(self.table);
        self.report.overview(raw_rows, &columns, self.table.height())?;
        Ok(())
    }

    fn sales_by_year(&mut self) -> Result<()> {
        info!("step: sales by release year");
        self.report.section("Total sales by release year")?;
        let by_year = sum_by_year(self.table, "total_sales")?;
        for (year, sales) in &by_year {
            self.report.line(&format!("{}: {:.2}", year, sales))?;
        }
        let data = BarChartData {
            labels: ChartLabels::new(
                "sales_by_year.png",
                "Total sales by release year",
                "Year",
                "Total sales (millions)",
            ),
            categories: by_year.iter().map(|(y, _)| y.to_string()).collect(),
            values: by_year.iter().map(|(_, v)| *v).collect(),
        };
        self.chart(|r| r.bar_chart(&data))
    }

    fn top_games_overall(&mut self) -> Result<()> {
        info!("step: top games");
        self.report.section("Best-selling games")?;
        let games = top_games(self.table, self.config.top_games)?;
        self.report
            .games(&format!("Top {} games by total sales", self.config.top_games), &games)?;
        Ok(())
    }

    fn platform_evolution(&mut self) -> Result<()> {
        info!(window = %RECENT_WINDOW, "step: platform evolution");
        self.report
            .section(&format!("Platform sales by year ({})", RECENT_WINDOW))?;
        let window = DataProcessor::filter_by_year(self.table, RECENT_WINDOW)?;
        let top = SalesAggregator::top_k(
            &window,
            "platform",
            &["total_sales"],
            self.config.top_k,
            false,
        )?;
        self.report
            .ranked(&format!("Top {} platforms", self.config.top_k), &top)?;

        let years: Vec<i64> = RECENT_WINDOW.years().collect();
        let mut series = Vec::with_capacity(top.len());
        for platform in top.groups() {
            let rows = DataProcessor::filter_eq(&window, "platform", &platform)?;
            let by_year = sum_by_year(&rows, "total_sales")?;
            let values = years
                .iter()
                .map(|y| {
                    by_year
                        .iter()
                        .find(|(year, _)| year == y)
                        .map(|(_, v)| *v)
                        .unwrap_or(0.0)
                })
                .collect();
            series.push((platform, values));
        }
        let data = GroupedBarChartData {
            labels: ChartLabels::new(
                "platform_sales_2010_2016.png",
                &format!("Sales by year and top platforms ({})", RECENT_WINDOW),
                "Release year",
                "Total sales (millions)",
            ),
            years: years.clone(),
            series,
        };
        self.chart(|r| r.grouped_bar_chart(&data))?;

        for year in years {
            let rows = DataProcessor::filter_by_year(self.table, YearRange::new(year, year))?;
            let games = top_games(&rows, self.config.top_games)?;
            self.report.line("")?;
            self.report.games(&format!("Top games in {}", year), &games)?;
        }
        Ok(())
    }

    fn lapso_summary(&mut self) -> Result<()> {
        info!("step: lapso summary");
        self.report.section("Lapsos")?;
        let mut summaries = Vec::with_capacity(LAPSOS.len());
        for lapso in LAPSOS {
            let rows = DataProcessor::filter_by_year(self.table, lapso)?;
            let top_platforms = SalesAggregator::top_k(
                &rows,
                "platform",
                &["total_sales"],
                self.config.top_k,
                false,
            )?;
            summaries.push(LapsoSummary {
                label: lapso.to_string(),
                games: rows.height(),
                top_platforms,
            });
        }
        self.report.lapsos(&summaries)?;
        Ok(())
    }

    fn platform_distribution(&mut self) -> Result<()> {
        info!(window = %RELEVANT_WINDOW, "step: platform distribution");
        self.report.section(&format!(
            "Total sales distribution by platform ({})",
            RELEVANT_WINDOW
        ))?;
        let window = DataProcessor::filter_by_year(self.table, RELEVANT_WINDOW)?;
        let top = SalesAggregator::top_k(
            &window,
            "platform",
            &["total_sales"],
            self.config.top_k,
            false,
        )?;

        let mut groups = Vec::with_capacity(top.len());
        let mut stats = Vec::with_capacity(top.len());
        for platform in top.groups() {
            let rows = DataProcessor::filter_eq(&window, "platform", &platform)?;
            let values = DataProcessor::f64_values(&rows, "total_sales")?;
            stats.push(StatsCalculator::compute_descriptive_stats(&platform, &values));
            groups.push((platform, values));
        }
        self.report.distribution(&stats)?;

        let data = BoxplotData {
            labels: ChartLabels::new(
                "platform_boxplot_2011_2016.png",
                &format!("Global sales distribution by platform ({})", RELEVANT_WINDOW),
                "Platform",
                "Global sales (millions)",
            ),
            groups,
        };
        self.chart(|r| r.boxplot(&data))
    }

    fn critic_vs_sales(&mut self) -> Result<()> {
        info!(platform = CORRELATION_PLATFORM, "step: critic score vs sales");
        self.report.section(&format!(
            "Critic score vs sales ({}, {})",
            CORRELATION_PLATFORM, RELEVANT_WINDOW
        ))?;
        let window = DataProcessor::filter_by_year(self.table, RELEVANT_WINDOW)?;
        let rows = DataProcessor::filter_eq(&window, "platform", CORRELATION_PLATFORM)?;

        let corr = pearson_corr(&rows, "critic_score", "total_sales")?;
        if corr.is_none() {
            warn!(platform = CORRELATION_PLATFORM, "correlation undefined");
        }
        self.report
            .correlation("critic score vs total sales", corr)?;

        let data = ScatterData {
            labels: ChartLabels::new(
                "ps4_critic_vs_sales.png",
                &format!("Critic score vs sales ({})", CORRELATION_PLATFORM),
                "Critic score",
                "Global sales (millions)",
            ),
            points: DataProcessor::f64_pairs(&rows, "critic_score", "total_sales")?,
        };
        self.chart(|r| r.scatter(&data))
    }

    fn genre_sales(&mut self) -> Result<()> {
        info!(window = %RELEVANT_WINDOW, "step: genre sales");
        self.report
            .section(&format!("Total sales by genre ({})", RELEVANT_WINDOW))?;
        let window = DataProcessor::filter_by_year(self.table, RELEVANT_WINDOW)?;
        let genres = SalesAggregator::aggregate(
            &window,
            &AggregateRequest {
                group_column: "genre",
                value_columns: &["total_sales"],
                op: AggOp::Sum,
                k: None,
                with_share: false,
            },
        )?;
        self.report.ranked("Genres", &genres)?;

        let data = BarChartData {
            labels: ChartLabels::new(
                "genre_sales_2011_2016.png",
                &format!("Total sales by genre ({})", RELEVANT_WINDOW),
                "Genre",
                "Global sales (millions)",
            ),
            categories: genres.groups(),
            values: genres.primary_values(),
        };
        self.chart(|r| r.bar_chart(&data))
    }

    fn regional_tops(&mut self, group_column: &str, heading: &str) -> Result<()> {
        info!(group = group_column, window = %CURRENT_WINDOW, "step: regional shares");
        self.report.section(&format!(
            "{} by region with market share ({})",
            heading, CURRENT_WINDOW
        ))?;
        let window = DataProcessor::filter_by_year(self.table, CURRENT_WINDOW)?;
        for (column, region) in REPORTED_REGIONS {
            let table: RankedTable =
                SalesAggregator::top_k(&window, group_column, &[column], self.config.top_k, true)?;
            self.report
                .ranked(&format!("Top {} {}", self.config.top_k, region), &table)?;
        }
        Ok(())
    }

    fn rating_profile(&mut self) -> Result<()> {
        info!(window = %CURRENT_WINDOW, "step: rating profile");
        self.report
            .section(&format!("Mean regional sales by ESRB rating ({})", CURRENT_WINDOW))?;
        let window = DataProcessor::filter_by_year(self.table, CURRENT_WINDOW)?;
        let window = DataProcessor::fill_missing(&window, "rating", UNKNOWN_RATING)?;
        let regions: Vec<&str> = REPORTED_REGIONS.iter().map(|(c, _)| *c).collect();
        let table = SalesAggregator::mean_by(&window, "rating", &regions)?;
        self.report.ranked("Mean sales per game", &table)?;
        Ok(())
    }

    fn hypothesis_tests(&mut self) -> Result<()> {
        info!(window = %CURRENT_WINDOW, "step: hypothesis tests");
        self.report
            .section(&format!("User score hypothesis tests ({})", CURRENT_WINDOW))?;
        let window = DataProcessor::filter_by_year(self.table, CURRENT_WINDOW)?;
        let scored = DataProcessor::drop_missing(&window, "user_score")?;

        for scenario in SCENARIOS {
            let column = scenario.kind.column();
            let left = DataProcessor::f64_values(
                &DataProcessor::filter_eq(&scored, column, scenario.left)?,
                "user_score",
            )?;
            let right = DataProcessor::f64_values(
                &DataProcessor::filter_eq(&scored, column, scenario.right)?,
                "user_score",
            )?;
            let result = StatsCalculator::welch_t_test(&left, &right);
            if result.is_none() {
                warn!(
                    scenario = scenario.title,
                    left = left.len(),
                    right = right.len(),
                    "welch test undefined"
                );
            }
            self.report.line("")?;
            self.report
                .welch(scenario.title, scenario.left, scenario.right, result.as_ref())?;
        }
        Ok(())
    }
}
