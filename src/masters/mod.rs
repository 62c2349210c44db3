pub mod cache;
pub mod dataset;
pub mod error;
pub mod keys;
pub mod source;

pub use cache::MasterDatasetCache;
pub use dataset::MasterDataset;
pub use error::MasterDataError;
pub use keys::DatasetKey;
pub use source::{CsvDirectorySource, InMemorySource, MasterDataSource};
