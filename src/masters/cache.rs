// src/masters/cache.rs - Load-once, share-forever access to reference tables
use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::dataset::MasterDataset;
use super::error::MasterDataError;
use super::keys::DatasetKey;
use super::source::{CsvDirectorySource, MasterDataSource};

/// Process-wide dataset cache. Each key has its own slot, so a slow load of
/// one table never blocks readers of another. Concurrent first requests for
/// the same key wait on a single load; failed loads leave the slot empty and
/// the next request retries.
pub struct MasterDatasetCache {
    source: Box<dyn MasterDataSource>,
    slots: [OnceCell<Arc<MasterDataset>>; DatasetKey::COUNT],
}

impl MasterDatasetCache {
    pub fn new(source: impl MasterDataSource + 'static) -> Self {
        info!("Master dataset cache backed by {}", source.describe());
        Self {
            source: Box::new(source),
            slots: Default::default(),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(CsvDirectorySource::new(dir))
    }

    pub fn load(&self, key: DatasetKey) -> Result<Arc<MasterDataset>, MasterDataError> {
        let slot = &self.slots[key.index()];
        if let Some(dataset) = slot.get() {
            return Ok(Arc::clone(dataset));
        }

        slot.get_or_try_init(|| {
            let start = Instant::now();
            match self.source.load(key) {
                Ok(dataset) => {
                    info!(
                        "📚 Loaded master dataset '{}' ({} rows, {} columns) in {:.2?}",
                        key,
                        dataset.len(),
                        dataset.columns().len(),
                        start.elapsed()
                    );
                    Ok(Arc::new(dataset))
                }
                Err(e) => {
                    warn!("Master dataset '{}' unavailable: {}", key, e);
                    Err(e)
                }
            }
        })
        .map(Arc::clone)
    }

    /// Same as [`Self::load`] for callers holding a textual key.
    pub fn load_str(&self, key: &str) -> Result<Arc<MasterDataset>, MasterDataError> {
        let key: DatasetKey = key.parse()?;
        self.load(key)
    }

    /// Loads the table when needed, then returns the non-null values of one
    /// column (the first column when `column` is `None`).
    pub fn get_values(
        &self,
        key: DatasetKey,
        column: Option<&str>,
    ) -> Result<Vec<String>, MasterDataError> {
        self.load(key)?.values(column)
    }

    /// Table if it can be loaded, `None` otherwise. Callers treat absence as
    /// "reference data unavailable" and degrade.
    pub fn try_load(&self, key: DatasetKey) -> Option<Arc<MasterDataset>> {
        match self.load(key) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                debug!("Continuing without master dataset '{}': {}", key, e);
                None
            }
        }
    }

    /// Loads the given tables up front so the first normalization does not pay
    /// for them. Stops at the first failure.
    pub fn preload(&self, keys: &[DatasetKey]) -> Result<usize> {
        let mut rows = 0;
        for key in keys {
            let dataset = self
                .load(*key)
                .with_context(|| format!("preloading master dataset '{}'", key))?;
            rows += dataset.len();
        }
        info!("Preloaded {} master datasets ({} rows)", keys.len(), rows);
        Ok(rows)
    }

    pub fn is_loaded(&self, key: DatasetKey) -> bool {
        self.slots[key.index()].get().is_some()
    }
}
