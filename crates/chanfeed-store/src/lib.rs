//! # chanfeed-store
//!
//! Post store backends: SQLite document store and flat `posts.json` file.

pub mod document;
pub mod flatfile;

pub use document::DocumentStore;
pub use flatfile::FlatFileStore;

use chanfeed_core::{
    config::{StoreBackend, StoreConfig},
    error::FeedError,
    traits::PostStore,
};

/// Build the configured store backend.
pub async fn build(config: &StoreConfig) -> Result<Box<dyn PostStore>, FeedError> {
    match config.backend {
        StoreBackend::Sqlite => Ok(Box::new(DocumentStore::new(&config.db_path).await?)),
        StoreBackend::File => Ok(Box::new(FlatFileStore::new(&config.file_path))),
    }
}
