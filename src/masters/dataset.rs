// src/masters/dataset.rs - Immutable in-memory reference table
use std::collections::HashMap;

use super::error::MasterDataError;
use super::keys::DatasetKey;

/// One loaded reference table. Cells are trimmed on construction and empty
/// cells are stored as `None`, so every consumer sees the same null handling.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterDataset {
    key: DatasetKey,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Lowercased, trimmed, with runs of spaces or dashes folded to `_`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl MasterDataset {
    pub fn new(key: DatasetKey, columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<Option<String>> = row
                    .into_iter()
                    .take(width)
                    .map(|cell| {
                        cell.map(|c| c.trim().to_string())
                            .filter(|c| !c.is_empty())
                    })
                    .collect();
                cells.resize(width, None);
                cells
            })
            .collect();
        Self { key, columns, rows }
    }

    /// Convenience constructor for fixtures; empty strings become nulls.
    pub fn from_rows(key: DatasetKey, columns: &[&str], rows: &[&[&str]]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| Some(cell.to_string())).collect())
            .collect();
        Self::new(key, columns, rows)
    }

    pub fn key(&self) -> DatasetKey {
        self.key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup; `Zip Code`, `zip_code` and `ZIP-CODE`
    /// all resolve to the same column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_column_name(name);
        self.columns
            .iter()
            .position(|c| normalize_column_name(c) == wanted)
    }

    /// First column whose normalized name satisfies `pred`.
    pub fn find_column<F>(&self, pred: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.columns
            .iter()
            .position(|c| pred(&normalize_column_name(c)))
    }

    /// All columns whose normalized name satisfies `pred`, in table order.
    pub fn find_columns<F>(&self, pred: F) -> Vec<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(&normalize_column_name(c)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Non-null values of one column, table order preserved.
    pub fn column_values(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column).and_then(|c| c.clone()))
            .collect()
    }

    /// Non-null values of the named column, or of the first column when no
    /// name is given.
    pub fn values(&self, column: Option<&str>) -> Result<Vec<String>, MasterDataError> {
        match column {
            None => Ok(self.primary_values()),
            Some(name) => self
                .column_index(name)
                .map(|idx| self.column_values(idx))
                .ok_or_else(|| MasterDataError::MissingColumn {
                    key: self.key.as_str(),
                    column: name.to_string(),
                }),
        }
    }

    pub fn primary_values(&self) -> Vec<String> {
        if self.columns.is_empty() {
            return Vec::new();
        }
        self.column_values(0)
    }

    /// Values of the first column whose normalized name contains `hint`,
    /// falling back to the first column.
    pub fn preferred_values(&self, hint: &str) -> Vec<String> {
        let hint = normalize_column_name(hint);
        match self.find_column(|c| c.contains(hint.as_str())) {
            Some(idx) => self.column_values(idx),
            None => self.primary_values(),
        }
    }

    /// Row as a map from normalized column name to value; nulls are skipped.
    pub fn row_map(&self, row: usize) -> HashMap<String, String> {
        let Some(cells) = self.rows.get(row) else {
            return HashMap::new();
        };
        self.columns
            .iter()
            .zip(cells.iter())
            .filter_map(|(col, cell)| {
                cell.as_ref()
                    .map(|value| (normalize_column_name(col), value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caste_table() -> MasterDataset {
        MasterDataset::from_rows(
            DatasetKey::Caste,
            &["Jaati", "Caste", "Gotra", "Sakha"],
            &[
                &["Brahmin", "Pareek", "Bharadwaj", "Madhyandini"],
                &["Brahmin", "Gaur", "", "Kauthumi"],
            ],
        )
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = caste_table();
        assert_eq!(table.column_index("gotra"), Some(2));
        assert_eq!(table.column_index(" SAKHA "), Some(3));
        assert_eq!(table.column_index("community"), None);
    }

    #[test]
    fn test_values_skip_nulls_and_keep_order() {
        let table = caste_table();
        assert_eq!(table.values(Some("Gotra")).unwrap(), vec!["Bharadwaj"]);
        assert_eq!(table.values(None).unwrap(), vec!["Brahmin", "Brahmin"]);
    }

    #[test]
    fn test_preferred_values_skip_id_columns() {
        let table = MasterDataset::from_rows(
            DatasetKey::MaritalStatus,
            &["Id", "Marital Status"],
            &[&["1", "Single"], &["2", "Married"]],
        );
        assert_eq!(table.preferred_values("marital"), vec!["Single", "Married"]);
        assert_eq!(table.preferred_values("manglik"), vec!["1", "2"]);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = caste_table().values(Some("Region")).unwrap_err();
        assert!(matches!(err, MasterDataError::MissingColumn { .. }));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = MasterDataset::new(
            DatasetKey::Height,
            vec!["Height".into(), "Cms".into()],
            vec![vec![Some(" 5ft 2in ".into())]],
        );
        assert_eq!(table.cell(0, 0), Some("5ft 2in"));
        assert_eq!(table.cell(0, 1), None);
    }

    #[test]
    fn test_row_map_uses_normalized_names() {
        let table = MasterDataset::from_rows(
            DatasetKey::CountryState,
            &["Country Name", "State"],
            &[&["India", "Rajasthan"]],
        );
        let row = table.row_map(0);
        assert_eq!(row.get("country_name").map(String::as_str), Some("India"));
        assert_eq!(row.get("state").map(String::as_str), Some("Rajasthan"));
    }
}
