//! CSV Data Loader Module
//! Reads the tracking and order exports with Polars.

use crate::settings::ColumnMap;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("{file} is missing required columns: {}", missing.join(", "))]
    MissingColumns { file: PathBuf, missing: Vec<String> },
}

/// Loads delimited exports as all-string frames.
///
/// Schema inference is disabled so waybill numbers and postal codes keep
/// their leading zeros; typed parsing happens later, per column.
pub struct DataLoader {
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl DataLoader {
    pub fn new(separator: u8) -> Self {
        Self { separator }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&self, file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::FileNotFound(file_path.to_path_buf()));
        }

        let path_str = file_path.to_string_lossy().to_string();
        let df = LazyCsvReader::new(&path_str)
            .with_separator(self.separator)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        debug!(
            "Read {} rows, {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        Ok(df)
    }

    /// Load the mandatory tracking export and check every column the
    /// derivation reads.
    pub fn load_tracking(
        &self,
        file_path: &Path,
        columns: &ColumnMap,
    ) -> Result<DataFrame, LoaderError> {
        let df = self.load_csv(file_path)?;
        require_columns(&df, file_path, &columns.required_tracking_columns())?;
        info!("Loaded tracking export: {} rows", df.height());
        Ok(df)
    }

    /// Load the order export, keeping only the waybill and destination
    /// columns it actually carries.
    pub fn load_orders(
        &self,
        file_path: &Path,
        columns: &ColumnMap,
    ) -> Result<DataFrame, LoaderError> {
        let df = self.load_csv(file_path)?;
        require_columns(&df, file_path, &[columns.waybill.as_str()])?;

        let present = get_columns(&df);
        let mut keep = vec![columns.waybill.clone()];
        keep.extend(
            columns
                .destination_columns()
                .iter()
                .filter(|name| present.iter().any(|p| p == *name))
                .map(|name| name.to_string()),
        );

        let df = df.select(keep)?;
        info!(
            "Loaded order export: {} rows, columns {:?}",
            df.height(),
            get_columns(&df)
        );
        Ok(df)
    }
}

/// Get list of column names from a DataFrame.
pub fn get_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Whether `df` carries a column called `name`.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn require_columns(df: &DataFrame, file_path: &Path, required: &[&str]) -> Result<(), LoaderError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoaderError::MissingColumns {
            file: file_path.to_path_buf(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_keeps_leading_zeros() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "orders.csv", "id,cep\n001,01310100\n002,4567000\n");

        let df = DataLoader::default().load_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        let cep = df.column("cep").unwrap();
        assert_eq!(cep.dtype(), &DataType::String);
        assert_eq!(cep.str().unwrap().get(0), Some("01310100"));
        assert_eq!(df.column("id").unwrap().str().unwrap().get(0), Some("001"));
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::default()
            .load_csv(Path::new("/nonexistent/tracking.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }

    #[test]
    fn test_tracking_requires_columns() {
        let dir = TempDir::new().unwrap();
        let columns = ColumnMap::default();
        let path = write(&dir, "tracking.csv", "Número do Waybill,estado\nW1,SP\n");

        let err = DataLoader::default()
            .load_tracking(&path, &columns)
            .unwrap_err();
        match err {
            LoaderError::MissingColumns { missing, .. } => {
                assert!(missing.contains(&columns.delivery_point));
                assert!(missing.contains(&columns.signed));
                assert!(!missing.contains(&columns.waybill));
                assert_eq!(missing.len(), 16);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_orders_selects_destination_columns() {
        let dir = TempDir::new().unwrap();
        let columns = ColumnMap::default();
        let path = write(
            &dir,
            "orders.csv",
            "Número do Waybill;Peso;CEP do destinatário\nW1;2.5;01310100\n",
        );

        let df = DataLoader::new(b';').load_orders(&path, &columns).unwrap();
        assert_eq!(
            get_columns(&df),
            vec![columns.waybill.clone(), columns.postal_code.clone()]
        );
    }

    #[test]
    fn test_orders_without_waybill_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "orders.csv", "CEP do destinatário\n01310100\n");

        let err = DataLoader::default()
            .load_orders(&path, &ColumnMap::default())
            .unwrap_err();
        assert!(err.to_string().contains("Número do Waybill"));
    }
}
