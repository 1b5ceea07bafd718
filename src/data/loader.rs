//! CSV Data Loader Module
//! Reads the games file into a Polars DataFrame.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV {path}: {source}")]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Input file {0} contains no rows")]
    NoData(PathBuf),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 10000,
        }
    }

    /// Load a CSV file using Polars.
    ///
    /// Unparsable cells become nulls instead of failing the load; only a
    /// missing or unreadable file is an error.
    pub fn load_csv(&self, file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let wrap = |source| LoaderError::CsvError {
            path: file_path.to_path_buf(),
            source,
        };

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_ignore_errors(true)
            .finish()
            .map_err(wrap)?
            .collect()
            .map_err(wrap)?;

        if df.height() == 0 {
            return Err(LoaderError::NoData(file_path.to_path_buf()));
        }

        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded input file"
        );
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("game_sales_eda_loader");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_rows_and_headers() {
        let path = temp_csv(
            "small.csv",
            "Name,Platform,Year_of_Release,Genre\n\
             Wii Sports,Wii,2006,Sports\n\
             Tetris,GB,1989,Puzzle\n",
        );
        let df = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["Name", "Platform", "Year_of_Release", "Genre"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("game_sales_eda_loader/does_not_exist.csv");
        let err = DataLoader::new().load_csv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn header_only_file_has_no_data() {
        let path = temp_csv("header_only.csv", "Name,Platform,Genre\n");
        assert!(DataLoader::new().load_csv(&path).is_err());
    }
}
