//! Run configuration
//! Command-line arguments plus the fixed analysis windows and scenarios.

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// Marker the source uses for a user score that is "to be determined".
pub const USER_SCORE_SENTINEL: &str = "tbd";

/// Category used for games without an ESRB rating.
pub const UNKNOWN_RATING: &str = "Unknown";

/// Columns that must be present (after lowercasing) for the analysis to run.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "name",
    "platform",
    "year_of_release",
    "genre",
    "na_sales",
    "eu_sales",
    "jp_sales",
    "other_sales",
    "critic_score",
    "user_score",
    "rating",
];

/// Regional sales columns summed into `total_sales`.
pub const REGIONAL_SALES: [&str; 4] = ["na_sales", "eu_sales", "jp_sales", "other_sales"];

/// Regions reported in the market share and rating steps.
pub const REPORTED_REGIONS: [(&str, &str); 3] = [
    ("na_sales", "NA"),
    ("eu_sales", "EU"),
    ("jp_sales", "JP"),
];

/// Inclusive range of release years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i64,
    pub end: i64,
}

impl YearRange {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn years(&self) -> impl Iterator<Item = i64> {
        self.start..=self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Window for the platform evolution step.
pub const RECENT_WINDOW: YearRange = YearRange::new(2010, 2016);
/// Window for the distribution, critic and genre steps.
pub const RELEVANT_WINDOW: YearRange = YearRange::new(2011, 2016);
/// Window for the regional profiles and hypothesis tests.
pub const CURRENT_WINDOW: YearRange = YearRange::new(2012, 2016);

/// Decade-aligned lapsos.
pub const LAPSOS: [YearRange; 4] = [
    YearRange::new(1980, 1989),
    YearRange::new(1990, 1999),
    YearRange::new(2000, 2009),
    YearRange::new(2010, 2016),
];

/// Platform whose critic score / sales relation is inspected.
pub const CORRELATION_PLATFORM: &str = "PS4";

/// Which column a hypothesis scenario filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Platform,
    Genre,
}

impl ScenarioKind {
    pub fn column(&self) -> &'static str {
        match self {
            ScenarioKind::Platform => "platform",
            ScenarioKind::Genre => "genre",
        }
    }
}

/// Two user-score samples compared with Welch's test.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub title: &'static str,
    pub kind: ScenarioKind,
    pub left: &'static str,
    pub right: &'static str,
}

pub const SCENARIOS: [Scenario; 2] = [
    Scenario {
        title: "Xbox One vs PC",
        kind: ScenarioKind::Platform,
        left: "XOne",
        right: "PC",
    },
    Scenario {
        title: "Action vs Sports",
        kind: ScenarioKind::Genre,
        left: "Action",
        right: "Sports",
    },
];

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AnalysisConfig {
    /// Path to the games CSV file
    #[arg(default_value = "games.csv")]
    pub input: PathBuf,

    /// Directory where chart images are written
    #[arg(long, default_value = "charts")]
    pub output_dir: PathBuf,

    /// Print tables only, do not render charts
    #[arg(long)]
    pub no_charts: bool,

    /// Number of platforms / genres kept by the top-K steps
    #[arg(long = "top", default_value_t = 5)]
    pub top_k: usize,

    /// Number of games listed by the top games steps
    #[arg(long, default_value_t = 10)]
    pub top_games: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl AnalysisConfig {
    /// Default tracing filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_iterates_inclusively() {
        let range = YearRange::new(2012, 2016);
        let years: Vec<i64> = range.years().collect();
        assert_eq!(years, vec![2012, 2013, 2014, 2015, 2016]);
        assert_eq!(range.to_string(), "2012-2016");
    }

    #[test]
    fn parses_defaults() {
        let config = AnalysisConfig::parse_from(["game_sales_eda"]);
        assert_eq!(config.input, PathBuf::from("games.csv"));
        assert_eq!(config.output_dir, PathBuf::from("charts"));
        assert_eq!(config.top_k, 5);
        assert_eq!(config.top_games, 10);
        assert!(!config.no_charts);
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn parses_flags() {
        let config = AnalysisConfig::parse_from([
            "game_sales_eda",
            "data/games.csv",
            "--output-dir",
            "out",
            "--no-charts",
            "--top",
            "3",
            "-vv",
        ]);
        assert_eq!(config.input, PathBuf::from("data/games.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.no_charts);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.log_filter(), "debug");
    }
}
