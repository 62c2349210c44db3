pub mod enrichment;
pub mod helpers;
pub mod normalizer;
pub mod schema;
