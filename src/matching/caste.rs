// src/matching/caste.rs - Community hierarchy resolution against the caste table
use log::debug;
use std::sync::Arc;

use crate::masters::{DatasetKey, MasterDataset, MasterDatasetCache};
use crate::matching::matcher::{eq_ignore_case, ApproximateMatcher, MatchMethod};
use crate::utils::logging::{Component, NormalizationLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CasteField {
    Jaati,
    Caste,
    Gotra,
    Sakha,
}

impl CasteField {
    /// Search order: the most specific level first.
    pub const SEARCH_ORDER: [CasteField; 4] = [
        CasteField::Gotra,
        CasteField::Sakha,
        CasteField::Caste,
        CasteField::Jaati,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CasteField::Jaati => "jaati",
            CasteField::Caste => "caste",
            CasteField::Gotra => "gotra",
            CasteField::Sakha => "sakha",
        }
    }
}

/// One row of the caste table. All four levels come from the same row.
#[derive(Debug, Clone, PartialEq)]
pub struct CasteRecord {
    pub jaati: Option<String>,
    pub caste: Option<String>,
    pub gotra: Option<String>,
    pub sakha: Option<String>,
    pub matched_on: CasteField,
    pub method: MatchMethod,
    pub score: f64,
}

impl CasteRecord {
    pub fn get(&self, field: CasteField) -> Option<&str> {
        match field {
            CasteField::Jaati => self.jaati.as_deref(),
            CasteField::Caste => self.caste.as_deref(),
            CasteField::Gotra => self.gotra.as_deref(),
            CasteField::Sakha => self.sakha.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CasteResolver {
    dataset: Option<Arc<MasterDataset>>,
    matcher: ApproximateMatcher,
}

impl CasteResolver {
    pub fn new(dataset: Option<Arc<MasterDataset>>, matcher: ApproximateMatcher) -> Self {
        Self { dataset, matcher }
    }

    pub fn from_cache(cache: &MasterDatasetCache, matcher: ApproximateMatcher) -> Self {
        Self::new(cache.try_load(DatasetKey::Caste), matcher)
    }

    pub fn is_available(&self) -> bool {
        self.dataset.is_some()
    }

    fn columns(&self, dataset: &MasterDataset) -> Vec<(CasteField, usize)> {
        CasteField::SEARCH_ORDER
            .iter()
            .filter_map(|field| dataset.column_index(field.as_str()).map(|idx| (*field, idx)))
            .collect()
    }

    fn record(
        &self,
        dataset: &MasterDataset,
        row: usize,
        matched_on: CasteField,
        method: MatchMethod,
        score: f64,
    ) -> CasteRecord {
        let cell = |field: CasteField| {
            dataset
                .column_index(field.as_str())
                .and_then(|col| dataset.cell(row, col))
                .map(str::to_string)
        };
        CasteRecord {
            jaati: cell(CasteField::Jaati),
            caste: cell(CasteField::Caste),
            gotra: cell(CasteField::Gotra),
            sakha: cell(CasteField::Sakha),
            matched_on,
            method,
            score,
        }
    }

    fn first_row_with(dataset: &MasterDataset, column: usize, value: &str) -> Option<usize> {
        (0..dataset.len()).find(|&row| {
            dataset
                .cell(row, column)
                .map_or(false, |cell| eq_ignore_case(cell, value))
        })
    }

    /// Exact pass over gotra, sakha, caste, jaati; then an approximate pass in
    /// the same order. The first hit returns its whole row.
    pub fn resolve(&self, value: &str) -> Option<CasteRecord> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let dataset = self.dataset.as_deref()?;
        let columns = self.columns(dataset);

        for (field, col) in &columns {
            if let Some(row) = Self::first_row_with(dataset, *col, value) {
                debug!("Caste value '{}' found exactly in {} column", value, field.as_str());
                return Some(self.record(dataset, row, *field, MatchMethod::Exact, 100.0));
            }
        }

        for (field, col) in &columns {
            let values = dataset.column_values(*col);
            let result = self.matcher.best_match(value, &values);
            if let Some(matched) = result.value {
                if let Some(row) = Self::first_row_with(dataset, *col, &matched) {
                    NormalizationLogger::new(Component::Caste).log_match(
                        field.as_str(),
                        value,
                        &matched,
                        result.score,
                        result.method.tag(),
                    );
                    return Some(self.record(dataset, row, *field, result.method, result.score));
                }
            }
        }

        debug!("No caste row for '{}'", value);
        None
    }

    /// Matches `value` against a single column, exact first then approximate at
    /// `threshold`. Returns the column value as stored in the table.
    pub fn match_field(&self, field: CasteField, value: &str, threshold: f64) -> Option<String> {
        let dataset = self.dataset.as_deref()?;
        let col = dataset.column_index(field.as_str())?;
        let values = dataset.column_values(col);
        self.matcher.lookup(value, &values, threshold).into_value()
    }

    pub fn threshold(&self) -> f64 {
        self.matcher.threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CasteResolver {
        let table = MasterDataset::from_rows(
            DatasetKey::Caste,
            &["Jaati", "Caste", "Gotra", "Sakha"],
            &[
                &["Brahmin", "Pareek", "Bharadwaj", "Madhyandini"],
                &["Brahmin", "Gaur", "Kashyap", "Kauthumi"],
                &["Vaishya", "Agarwal", "Garg", ""],
            ],
        );
        CasteResolver::new(Some(Arc::new(table)), ApproximateMatcher::default())
    }

    #[test]
    fn test_exact_gotra_returns_whole_row() {
        let record = resolver().resolve("kashyap").unwrap();
        assert_eq!(record.matched_on, CasteField::Gotra);
        assert_eq!(record.jaati.as_deref(), Some("Brahmin"));
        assert_eq!(record.caste.as_deref(), Some("Gaur"));
        assert_eq!(record.gotra.as_deref(), Some("Kashyap"));
        assert_eq!(record.sakha.as_deref(), Some("Kauthumi"));
        assert_eq!(record.method, MatchMethod::Exact);
    }

    #[test]
    fn test_exact_pass_runs_before_approximate() {
        // "Garg" exists exactly as a gotra; no approximate scoring should
        // pull in a different row first.
        let record = resolver().resolve("Garg").unwrap();
        assert_eq!(record.caste.as_deref(), Some("Agarwal"));
        assert_eq!(record.sakha, None);
    }

    #[test]
    fn test_approximate_match_keeps_row_together() {
        let record = resolver().resolve("Bharadwaja").unwrap();
        assert_eq!(record.gotra.as_deref(), Some("Bharadwaj"));
        assert_eq!(record.caste.as_deref(), Some("Pareek"));
        assert!(matches!(record.method, MatchMethod::Approximate(_)));
    }

    #[test]
    fn test_jaati_column_matches_last() {
        let record = resolver().resolve("Vaishya").unwrap();
        assert_eq!(record.matched_on, CasteField::Jaati);
        assert_eq!(record.gotra.as_deref(), Some("Garg"));
    }

    #[test]
    fn test_no_match_and_no_dataset() {
        assert!(resolver().resolve("Zzyzx").is_none());
        assert!(resolver().resolve("  ").is_none());
        let empty = CasteResolver::new(None, ApproximateMatcher::default());
        assert!(!empty.is_available());
        assert!(empty.resolve("Kashyap").is_none());
    }

    #[test]
    fn test_match_field_single_column() {
        let r = resolver();
        assert_eq!(r.match_field(CasteField::Caste, "pareek", 80.0).as_deref(), Some("Pareek"));
        assert_eq!(r.match_field(CasteField::Sakha, "Pareek", 80.0), None);
    }
}
