// src/models/mod.rs

//! Domain models for the sermon scraper.

mod config;
mod sermon;

pub use config::{
    Config, CrawlerConfig, PAGE_PLACEHOLDER, SelectorConfig, SourceConfig, StorageConfig,
};
pub use sermon::{AddOutcome, IngestOutcome, ListingEntry, SermonRecord};
