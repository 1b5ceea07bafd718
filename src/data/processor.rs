//! Data Processor Module
//! Normalizes the raw sales table and derives the per-step filtered views.

use crate::config::{YearRange, REGIONAL_SALES, REQUIRED_COLUMNS, USER_SCORE_SENTINEL};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column '{0}' is missing from the input")]
    MissingColumn(&'static str),
}

/// Dtype and missing count of one column, as shown in the dataset overview.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub missing: usize,
}

/// Coerce a raw user score cell into a number.
///
/// The sentinel marker and anything that is not a finite number map to `None`.
pub fn coerce_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(USER_SCORE_SENTINEL) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a raw release year cell into an integer year.
///
/// Accepts "2006" as well as the float rendering "2006.0"; fractional or
/// non-numeric values map to `None`.
pub fn coerce_year(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i64>() {
        return Some(year);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Handles data cleaning and filtering operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Produce the cleaned table every analysis step reads from.
    ///
    /// Steps run in a fixed order: lowercase the headers, coerce `user_score`
    /// (sentinel first, then any non-numeric value) and `year_of_release`,
    /// derive `total_sales`, and finally drop rows without name or genre.
    pub fn normalize(raw: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let mut df = Self::lowercase_columns(raw)?;

        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for required in REQUIRED_COLUMNS {
            if !present.iter().any(|name| name == required) {
                return Err(ProcessorError::MissingColumn(required));
            }
        }

        let user_score = Self::coerce_column(&df, "user_score", coerce_score)?;
        df.with_column(user_score)?;
        let year = Self::coerce_year_column(&df)?;
        df.with_column(year)?;

        let mut casts: Vec<Expr> = ["name", "platform", "genre", "rating"]
            .iter()
            .map(|c| col(*c).cast(DataType::String))
            .collect();
        casts.push(col("critic_score").cast(DataType::Float64));
        casts.extend(REGIONAL_SALES.iter().map(|c| col(*c).cast(DataType::Float64)));

        // Plain addition: a missing regional value makes total_sales missing.
        let total_sales = REGIONAL_SALES[1..]
            .iter()
            .fold(col(REGIONAL_SALES[0]), |acc, c| acc + col(*c))
            .alias("total_sales");

        let before = df.height();
        let cleaned = df
            .lazy()
            .with_columns(casts)
            .with_column(total_sales)
            .filter(col("name").is_not_null().and(col("genre").is_not_null()))
            .collect()?;

        info!(
            rows = cleaned.height(),
            dropped = before - cleaned.height(),
            "normalized sales table"
        );
        Ok(cleaned)
    }

    /// Lowercase every column identifier.
    pub fn lowercase_columns(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let lowered: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let mut df = df.clone();
        df.set_column_names(lowered)?;
        Ok(df)
    }

    fn coerce_column(
        df: &DataFrame,
        name: &str,
        coerce: fn(&str) -> Option<f64>,
    ) -> Result<Series, ProcessorError> {
        let raw = df.column(name)?.cast(&DataType::String)?;
        let values: Float64Chunked = raw
            .str()?
            .into_iter()
            .map(|v| v.and_then(coerce))
            .collect();
        let missing = values.null_count();
        debug!(column = name, missing, "coerced numeric column");
        Ok(values.with_name(name.into()).into_series())
    }

    fn coerce_year_column(df: &DataFrame) -> Result<Series, ProcessorError> {
        let raw = df.column("year_of_release")?.cast(&DataType::String)?;
        let years: Int64Chunked = raw
            .str()?
            .into_iter()
            .map(|v| v.and_then(coerce_year))
            .collect();
        debug!(missing = years.null_count(), "coerced year_of_release");
        Ok(years.with_name("year_of_release".into()).into_series())
    }

    /// Rows released inside `range` (inclusive); rows without a year are excluded.
    pub fn filter_by_year(df: &DataFrame, range: YearRange) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(
                col("year_of_release")
                    .gt_eq(lit(range.start))
                    .and(col("year_of_release").lt_eq(lit(range.end))),
            )
            .collect()?;
        debug!(window = %range, rows = filtered.height(), "filtered by year");
        Ok(filtered)
    }

    /// Rows whose string `column` equals `value`.
    pub fn filter_eq(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).eq(lit(value)))
            .collect()?;
        Ok(filtered)
    }

    /// Rows where `column` is present.
    pub fn drop_missing(df: &DataFrame, column: &str) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).is_not_null())
            .collect()?;
        Ok(filtered)
    }

    /// Replace missing values of a string column with `fallback`.
    pub fn fill_missing(
        df: &DataFrame,
        column: &str,
        fallback: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let filled = df
            .clone()
            .lazy()
            .with_column(col(column).fill_null(lit(fallback)))
            .collect()?;
        Ok(filled)
    }

    /// Non-missing values of a numeric column.
    pub fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, ProcessorError> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect())
    }

    /// Pairs of two numeric columns, keeping only rows where both are present.
    pub fn f64_pairs(
        df: &DataFrame,
        column_a: &str,
        column_b: &str,
    ) -> Result<Vec<(f64, f64)>, ProcessorError> {
        let a = df.column(column_a)?.cast(&DataType::Float64)?;
        let b = df.column(column_b)?.cast(&DataType::Float64)?;
        Ok(a.f64()?
            .into_iter()
            .zip(b.f64()?.into_iter())
            .filter_map(|pair| match pair {
                (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((x, y)),
                _ => None,
            })
            .collect())
    }

    /// Dtype and missing count for every column.
    pub fn column_summary(df: &DataFrame) -> Vec<ColumnSummary> {
        df.get_columns()
            .iter()
            .map(|c| ColumnSummary {
                name: c.name().to_string(),
                dtype: c.dtype().to_string(),
                missing: c.null_count(),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Raw table shaped like the games file, with mixed-case headers.
    pub(crate) fn raw_games() -> DataFrame {
        df!(
            "Name" => [Some("Wii Sports"), Some("Halo 5"), None, Some("FIFA 16"), Some("Bloodborne"), Some("Mystery")],
            "Platform" => ["Wii", "XOne", "PS4", "PS4", "PS4", "PC"],
            "Year_of_Release" => [Some("2006.0"), Some("2015"), Some("2014"), Some("2015"), Some("2015"), None],
            "Genre" => [Some("Sports"), Some("Shooter"), Some("Action"), Some("Sports"), Some("Action"), None],
            "NA_sales" => [Some(41.36), Some(2.78), Some(0.5), Some(0.66), Some(0.4), Some(0.1)],
            "EU_sales" => [Some(28.96), Some(1.27), Some(0.5), Some(3.75), Some(0.8), Some(0.1)],
            "JP_sales" => [Some(3.77), Some(0.03), Some(0.1), Some(0.06), None, Some(0.0)],
            "Other_sales" => [Some(8.45), Some(0.41), Some(0.1), Some(0.69), Some(0.2), Some(0.0)],
            "Critic_Score" => [Some(76.0), Some(84.0), None, Some(82.0), Some(92.0), None],
            "User_Score" => [Some("8"), Some("6.4"), Some("tbd"), Some("4.3"), Some("8.6"), Some("not a score")],
            "Rating" => [Some("E"), Some("T"), None, Some("E"), Some("M"), None]
        )
        .unwrap()
    }

    pub(crate) fn cleaned_games() -> DataFrame {
        DataProcessor::normalize(&raw_games()).unwrap()
    }

    #[test]
    fn coerce_score_is_total() {
        assert_eq!(coerce_score("8.5"), Some(8.5));
        assert_eq!(coerce_score(" 7 "), Some(7.0));
        assert_eq!(coerce_score("tbd"), None);
        assert_eq!(coerce_score("TBD"), None);
        assert_eq!(coerce_score(""), None);
        assert_eq!(coerce_score("great"), None);
        assert_eq!(coerce_score("NaN"), None);
        assert_eq!(coerce_score("inf"), None);
    }

    #[test]
    fn coerce_year_accepts_float_rendering() {
        assert_eq!(coerce_year("2006"), Some(2006));
        assert_eq!(coerce_year("2006.0"), Some(2006));
        assert_eq!(coerce_year("2006.5"), None);
        assert_eq!(coerce_year("N/A"), None);
        assert_eq!(coerce_year(""), None);
    }

    #[test]
    fn lowercases_headers() {
        let df = DataProcessor::lowercase_columns(&raw_games()).unwrap();
        for name in df.get_column_names() {
            assert_eq!(name.to_string(), name.to_lowercase());
        }
        assert!(df.column("na_sales").is_ok());
    }

    #[test]
    fn drops_rows_without_name_or_genre() {
        let df = cleaned_games();
        assert_eq!(df.height(), 4);
        assert_eq!(df.column("name").unwrap().null_count(), 0);
        assert_eq!(df.column("genre").unwrap().null_count(), 0);
    }

    #[test]
    fn total_sales_is_sum_of_regions() {
        let df = cleaned_games();
        let wii = DataProcessor::filter_eq(&df, "name", "Wii Sports").unwrap();
        let total = DataProcessor::f64_values(&wii, "total_sales").unwrap();
        assert_eq!(total.len(), 1);
        assert!((total[0] - 82.54).abs() < 1e-6);
    }

    #[test]
    fn total_sales_propagates_missing_region() {
        let df = cleaned_games();
        let bloodborne = DataProcessor::filter_eq(&df, "name", "Bloodborne").unwrap();
        assert_eq!(bloodborne.height(), 1);
        assert_eq!(bloodborne.column("total_sales").unwrap().null_count(), 1);
    }

    #[test]
    fn user_score_sentinel_becomes_missing() {
        let raw = df!(
            "Name" => ["A", "B", "C"],
            "Platform" => ["PC", "PC", "PC"],
            "Year_of_Release" => [2012i64, 2013, 2014],
            "Genre" => ["Action", "Action", "Action"],
            "NA_sales" => [1.0, 1.0, 1.0],
            "EU_sales" => [1.0, 1.0, 1.0],
            "JP_sales" => [1.0, 1.0, 1.0],
            "Other_sales" => [1.0, 1.0, 1.0],
            "Critic_Score" => [50.0, 60.0, 70.0],
            "User_Score" => ["tbd", "7.5", "oops"],
            "Rating" => ["E", "E", "E"]
        )
        .unwrap();
        let df = DataProcessor::normalize(&raw).unwrap();
        assert_eq!(df.column("user_score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("user_score").unwrap().null_count(), 2);
        assert_eq!(DataProcessor::f64_values(&df, "user_score").unwrap(), vec![7.5]);
    }

    #[test]
    fn year_is_nullable_integer() {
        let df = cleaned_games();
        let years = df.column("year_of_release").unwrap();
        assert_eq!(years.dtype(), &DataType::Int64);
        assert_eq!(years.i64().unwrap().get(0), Some(2006));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let raw = raw_games().drop("Rating").unwrap();
        let err = DataProcessor::normalize(&raw).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn("rating")));
    }

    #[test]
    fn filter_by_year_is_inclusive_and_idempotent() {
        let df = cleaned_games();
        let range = YearRange::new(2012, 2016);
        let once = DataProcessor::filter_by_year(&df, range).unwrap();
        assert_eq!(once.height(), 3);
        let twice = DataProcessor::filter_by_year(&once, range).unwrap();
        assert!(once.equals_missing(&twice));
        // the source table is untouched
        assert_eq!(df.height(), 4);
    }

    #[test]
    fn filter_by_year_excludes_missing_years() {
        let df = DataProcessor::lowercase_columns(&raw_games()).unwrap();
        let year = DataProcessor::coerce_year_column(&df).unwrap();
        let mut df = df;
        df.with_column(year).unwrap();
        let all = DataProcessor::filter_by_year(&df, YearRange::new(1900, 2100)).unwrap();
        assert_eq!(all.height(), 5);
    }

    #[test]
    fn fills_missing_rating() {
        let raw = raw_games();
        let mut with_missing_rating = raw.clone();
        with_missing_rating
            .with_column(Series::new(
                "Genre".into(),
                ["Sports", "Shooter", "Action", "Sports", "Action", "Misc"],
            ))
            .unwrap();
        let df = DataProcessor::normalize(&with_missing_rating).unwrap();
        let filled = DataProcessor::fill_missing(&df, "rating", "Unknown").unwrap();
        assert_eq!(filled.column("rating").unwrap().null_count(), 0);
        let unknown = DataProcessor::filter_eq(&filled, "rating", "Unknown").unwrap();
        assert_eq!(unknown.height(), 1);
    }

    #[test]
    fn pairs_are_pairwise_complete() {
        let df = cleaned_games();
        let pairs = DataProcessor::f64_pairs(&df, "critic_score", "total_sales").unwrap();
        // Bloodborne lacks total_sales
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn summary_reports_missing_counts() {
        let df = cleaned_games();
        let summary = DataProcessor::column_summary(&df);
        let user_score = summary.iter().find(|c| c.name == "user_score").unwrap();
        assert_eq!(user_score.missing, 0);
        let total = summary.iter().find(|c| c.name == "total_sales").unwrap();
        assert_eq!(total.missing, 1);
    }
}
