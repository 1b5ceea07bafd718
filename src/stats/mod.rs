//! Stats module - aggregation and statistical tests

mod aggregator;
mod calculator;

pub use aggregator::{AggOp, AggregateRequest, RankedTable, SalesAggregator};
pub use calculator::{GroupStats, StatsCalculator, WelchTest};
