// src/masters/source.rs - Where reference tables come from
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::dataset::MasterDataset;
use super::error::MasterDataError;
use super::keys::DatasetKey;

/// Backing store for reference tables. Implementations are called at most once
/// per key by [`super::MasterDatasetCache`] after a successful load.
pub trait MasterDataSource: Send + Sync {
    fn load(&self, key: DatasetKey) -> Result<MasterDataset, MasterDataError>;

    fn describe(&self) -> String;
}

/// Reads `<dir>/<FileStem>.csv` with a header row.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: DatasetKey) -> PathBuf {
        self.dir.join(format!("{}.csv", key.file_stem()))
    }
}

impl MasterDataSource for CsvDirectorySource {
    fn load(&self, key: DatasetKey) -> Result<MasterDataset, MasterDataError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(MasterDataError::NotFound {
                key: key.as_str(),
                location: path.display().to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| MasterDataError::load(key.as_str(), e))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| MasterDataError::load(key.as_str(), e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| MasterDataError::load(key.as_str(), e))?;
            rows.push(record.iter().map(|cell| Some(cell.to_string())).collect());
        }

        debug!(
            "Read {} rows x {} columns from {}",
            rows.len(),
            columns.len(),
            path.display()
        );
        Ok(MasterDataset::new(key, columns, rows))
    }

    fn describe(&self) -> String {
        format!("csv directory {}", self.dir.display())
    }
}

/// Tables held in memory; used for fixtures and for embedding callers that
/// already have the reference data loaded.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: HashMap<DatasetKey, MasterDataset>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dataset: MasterDataset) -> Self {
        self.insert(dataset);
        self
    }

    pub fn insert(&mut self, dataset: MasterDataset) {
        self.tables.insert(dataset.key(), dataset);
    }
}

impl MasterDataSource for InMemorySource {
    fn load(&self, key: DatasetKey) -> Result<MasterDataset, MasterDataError> {
        self.tables
            .get(&key)
            .cloned()
            .ok_or_else(|| MasterDataError::NotFound {
                key: key.as_str(),
                location: "in-memory source".to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("in-memory source ({} tables)", self.tables.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_csv_source_reads_headers_and_nulls() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("CasteMst.csv"),
            "Jaati,Caste,Gotra,Sakha\nBrahmin,Pareek,Bharadwaj,\nBrahmin, Gaur ,,Kauthumi\n",
        )
        .unwrap();

        let source = CsvDirectorySource::new(dir.path());
        let table = source.load(DatasetKey::Caste).unwrap();
        assert_eq!(table.columns(), &["Jaati", "Caste", "Gotra", "Sakha"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), Some("Gaur"));
        assert_eq!(table.cell(0, 3), None);
    }

    #[test]
    fn test_csv_source_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = CsvDirectorySource::new(dir.path())
            .load(DatasetKey::Height)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("HeightMst.csv"));
    }

    #[test]
    fn test_csv_source_strips_byte_order_mark() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ManglikMst.csv"), "\u{feff}Manglik\nYes\nNo\n").unwrap();
        let table = CsvDirectorySource::new(dir.path())
            .load(DatasetKey::Manglik)
            .unwrap();
        assert_eq!(table.column_index("manglik"), Some(0));
        assert_eq!(table.primary_values(), vec!["Yes", "No"]);
    }

    #[test]
    fn test_in_memory_source_returns_inserted_table() {
        let source = InMemorySource::new().with(MasterDataset::from_rows(
            DatasetKey::Manglik,
            &["Manglik"],
            &[&["Yes"]],
        ));
        assert!(source.load(DatasetKey::Manglik).is_ok());
        assert!(source.load(DatasetKey::Caste).unwrap_err().is_not_found());
    }
}
