//! Service layer for the sermon scraper.
//!
//! - Listing and sermon page parsing (`SermonParser`)

mod sermons;

pub use sermons::{SermonParser, clean_text};
