// src/normalization/schema.rs - Output field list
use log::{debug, warn};

use crate::masters::{DatasetKey, MasterDatasetCache};

/// Used whenever the output-schema table cannot be loaded.
pub const DEFAULT_SCHEMA: [&str; 33] = [
    "full_name",
    "first_name",
    "last_name",
    "gender",
    "date_of_birth",
    "age",
    "birth_time",
    "birth_place",
    "height",
    "marital_status",
    "religion",
    "caste",
    "jaati",
    "gotra",
    "sakha",
    "manglik",
    "education",
    "specialization",
    "occupation",
    "annual_income",
    "address",
    "village",
    "tahsil",
    "district",
    "native_state",
    "state",
    "city",
    "country",
    "zip_code",
    "email_id",
    "mobile_no",
    "phone_no",
    "about_yourself_summary",
];

pub fn default_schema() -> Vec<String> {
    DEFAULT_SCHEMA.iter().map(|f| f.to_string()).collect()
}

/// Header row of the output-schema table, de-duplicated in order. Falls back
/// to [`DEFAULT_SCHEMA`] when the table is missing or has no usable columns.
pub fn load_schema(cache: &MasterDatasetCache) -> Vec<String> {
    match cache.load(DatasetKey::BiodataOutput) {
        Ok(dataset) => {
            let mut fields: Vec<String> = Vec::with_capacity(dataset.columns().len());
            for column in dataset.columns() {
                let column = column.trim();
                if !column.is_empty() && !fields.iter().any(|f| f == column) {
                    fields.push(column.to_string());
                }
            }
            if fields.is_empty() {
                warn!("Output schema table has no columns; using built-in schema");
                return default_schema();
            }
            debug!("Output schema loaded with {} fields", fields.len());
            fields
        }
        Err(e) => {
            debug!("Using built-in output schema: {}", e);
            default_schema()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masters::{InMemorySource, MasterDataset};

    #[test]
    fn test_fallback_schema_when_table_missing() {
        let cache = MasterDatasetCache::new(InMemorySource::new());
        let schema = load_schema(&cache);
        assert_eq!(schema.len(), DEFAULT_SCHEMA.len());
        assert_eq!(schema[0], "full_name");
        assert_eq!(schema.last().map(String::as_str), Some("about_yourself_summary"));
    }

    #[test]
    fn test_schema_from_table_header() {
        let table = MasterDataset::from_rows(
            DatasetKey::BiodataOutput,
            &["full_name", "gender", "city", "gender", " "],
            &[],
        );
        let cache = MasterDatasetCache::new(InMemorySource::new().with(table));
        assert_eq!(load_schema(&cache), vec!["full_name", "gender", "city"]);
    }
}
