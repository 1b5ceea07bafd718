//! Data module - CSV loading, normalization and filtering

mod loader;
mod processor;

pub use loader::DataLoader;
pub use processor::{ColumnSummary, DataProcessor};

#[cfg(test)]
pub(crate) use processor::tests::cleaned_games;
