// src/masters/error.rs - Failures surfaced by the reference dataset layer
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum MasterDataError {
    #[error("no backing table for master dataset '{key}' (looked in {location})")]
    NotFound { key: &'static str, location: String },

    #[error("unknown master dataset key: {0}")]
    UnknownKey(String),

    #[error("failed to load master dataset '{key}': {source}")]
    Load {
        key: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("master dataset '{key}' has no column named '{column}'")]
    MissingColumn { key: &'static str, column: String },
}

impl MasterDataError {
    pub fn load(key: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Load {
            key,
            source: source.into(),
        }
    }

    /// True when the table simply does not exist, as opposed to existing but
    /// failing to parse.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
