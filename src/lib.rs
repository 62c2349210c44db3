// src/lib.rs
pub mod masters;
pub mod matching;
pub mod models;
pub mod normalization;
pub mod utils;
pub mod validation;

pub use masters::{DatasetKey, MasterDataError, MasterDataset, MasterDatasetCache};
pub use matching::matcher::{ApproximateMatcher, MatchMethod, MatchResult, ScorerKind};
pub use models::profile::{CanonicalProfile, RawProfile};
pub use normalization::normalizer::{NormalizationReport, ProfileNormalizer};
pub use utils::config::NormalizerConfig;
