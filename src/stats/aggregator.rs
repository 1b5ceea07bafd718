//! Group Aggregator Module
//! Top-K ranking of a categorical column by summed (or averaged) sales.

use polars::prelude::*;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("At least one value column is required")]
    NoValueColumns,
}

/// How values are combined within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggOp {
    #[default]
    Sum,
    Mean,
}

/// One ranked group.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub group: String,
    /// Aggregated values, in the same order as `RankedTable::value_columns`.
    pub values: Vec<f64>,
    /// Share of the first value column's total over the whole input, in percent.
    pub market_share: Option<f64>,
}

/// Ranked groups, sorted non-increasingly by the first value column.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTable {
    pub group_column: String,
    pub value_columns: Vec<String>,
    pub rows: Vec<RankedRow>,
}

impl RankedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Group labels in rank order.
    pub fn groups(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.group.clone()).collect()
    }

    /// Values of the first value column in rank order.
    pub fn primary_values(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.values.first().copied().unwrap_or(f64::NAN))
            .collect()
    }
}

impl fmt::Display for RankedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_share = self.rows.iter().any(|r| r.market_share.is_some());
        let width = self
            .rows
            .iter()
            .map(|r| r.group.len())
            .chain(std::iter::once(self.group_column.len()))
            .max()
            .unwrap_or(0);

        write!(f, "{:<width$}", self.group_column)?;
        for name in &self.value_columns {
            write!(f, " {:>12}", name)?;
        }
        if has_share {
            write!(f, " {:>12}", "market_share")?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<width$}", row.group)?;
            for value in &row.values {
                write!(f, " {:>12.2}", value)?;
            }
            if let Some(share) = row.market_share {
                write!(f, " {:>11.2}%", share)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Options for one aggregation call.
#[derive(Debug, Clone)]
pub struct AggregateRequest<'a> {
    pub group_column: &'a str,
    pub value_columns: &'a [&'a str],
    pub op: AggOp,
    /// `None` keeps every group.
    pub k: Option<usize>,
    pub with_share: bool,
}

/// Parameterized group-by aggregator shared by the platform, genre and rating steps.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Top `k` groups of `group_column` by summed `value_columns`.
    pub fn top_k(
        df: &DataFrame,
        group_column: &str,
        value_columns: &[&str],
        k: usize,
        with_share: bool,
    ) -> Result<RankedTable, AggregateError> {
        Self::aggregate(
            df,
            &AggregateRequest {
                group_column,
                value_columns,
                op: AggOp::Sum,
                k: Some(k),
                with_share,
            },
        )
    }

    /// Every group of `group_column` with the mean of `value_columns`.
    pub fn mean_by(
        df: &DataFrame,
        group_column: &str,
        value_columns: &[&str],
    ) -> Result<RankedTable, AggregateError> {
        Self::aggregate(
            df,
            &AggregateRequest {
                group_column,
                value_columns,
                op: AggOp::Mean,
                k: None,
                with_share: false,
            },
        )
    }

    /// Group, aggregate, sort descending by the first value column and truncate.
    ///
    /// Groups are kept in first-appearance order before a stable sort, so ties
    /// rank in the order their groups first occur in `df`. Rows with a missing
    /// group key are ignored. Market share divides by the first value column's
    /// total over all of `df`, not just the returned groups.
    pub fn aggregate(
        df: &DataFrame,
        request: &AggregateRequest<'_>,
    ) -> Result<RankedTable, AggregateError> {
        let primary = *request
            .value_columns
            .first()
            .ok_or(AggregateError::NoValueColumns)?;

        let aggs: Vec<Expr> = request
            .value_columns
            .iter()
            .map(|c| {
                let value = col(*c).cast(DataType::Float64);
                match request.op {
                    AggOp::Sum => value.sum(),
                    AggOp::Mean => value.mean(),
                }
            })
            .collect();

        let mut lazy = df
            .clone()
            .lazy()
            .filter(col(request.group_column).is_not_null())
            .with_column(col(request.group_column).cast(DataType::String))
            .group_by_stable([col(request.group_column)])
            .agg(aggs)
            .sort(
                [primary],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            );
        if let Some(k) = request.k {
            lazy = lazy.limit(k as IdxSize);
        }
        let grouped = lazy.collect()?;

        let total = if request.with_share {
            Some(Self::column_total(df, primary)?)
        } else {
            None
        };

        let groups = grouped.column(request.group_column)?.cast(&DataType::String)?;
        let groups = groups.str()?;
        let value_series = request
            .value_columns
            .iter()
            .map(|c| grouped.column(c)?.cast(&DataType::Float64))
            .collect::<PolarsResult<Vec<_>>>()?;
        let value_cas = value_series
            .iter()
            .map(|c| c.f64())
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(grouped.height());
        for i in 0..grouped.height() {
            let Some(group) = groups.get(i) else {
                continue;
            };
            let values: Vec<f64> = value_cas
                .iter()
                .map(|ca| ca.get(i).unwrap_or(f64::NAN))
                .collect();
            let market_share = total.map(|total| {
                if total > 0.0 {
                    values[0] / total * 100.0
                } else {
                    0.0
                }
            });
            rows.push(RankedRow {
                group: group.to_string(),
                values,
                market_share,
            });
        }

        Ok(RankedTable {
            group_column: request.group_column.to_string(),
            value_columns: request.value_columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    fn column_total(df: &DataFrame, column: &str) -> Result<f64, AggregateError> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.sum().unwrap_or(0.0))
    }
}
