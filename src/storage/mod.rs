//! Persistence for scraped sermons.
//!
//! Two stores move together:
//! - [`SermonIndex`]: SQLite table of (author, title, link)
//! - [`ContentStore`]: one text file per sermon under `sermons/`
//!
//! The text file is the authority. An index row without its file is an
//! orphan, removed by the reconcile pass; a file without a row is tolerated.

pub mod content;
pub mod index;

use crate::error::Result;
use crate::models::StorageConfig;

// Re-export for convenience
pub use content::{ContentStore, WriteOutcome};
pub use index::{InsertOutcome, SermonIndex};

/// The index and the content store, opened together.
#[derive(Clone)]
pub struct Storage {
    pub index: SermonIndex,
    pub content: ContentStore,
}

impl Storage {
    /// Open the configured index (creating its schema) and content root.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let index = SermonIndex::connect(&config.database_path).await?;
        index.ensure_schema().await?;
        Ok(Self {
            index,
            content: ContentStore::new(&config.sermons_dir),
        })
    }

    pub async fn close(&self) {
        self.index.close().await;
    }
}
