//! Sermon data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the sermon index.
///
/// Author and title are stored normalized; the triple is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SermonRecord {
    pub author: String,
    pub title: String,
    pub link: String,
}

impl SermonRecord {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            link: link.into(),
        }
    }
}

/// A sermon announced on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Title as shown on the listing page
    pub title: String,

    /// Absolute URL of the sermon page
    pub link: String,
}

/// What `add_sermon` did with a sermon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Index row inserted and text file written
    Written(SermonRecord),
    /// The text file was already on disk; the index was not touched
    AlreadySaved(SermonRecord),
    /// The index already had this exact triple; no file was written
    AlreadyIndexed(SermonRecord),
}

impl AddOutcome {
    pub fn record(&self) -> &SermonRecord {
        match self {
            Self::Written(r) | Self::AlreadySaved(r) | Self::AlreadyIndexed(r) => r,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Summary of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_fetched: usize,
    pub page_failures: usize,
    pub discovered: usize,
    pub written: usize,
    pub already_saved: usize,
    pub already_indexed: usize,
    pub anomalies: usize,
    pub failures: usize,
}

impl Default for IngestOutcome {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            pages_fetched: 0,
            page_failures: 0,
            discovered: 0,
            written: 0,
            already_saved: 0,
            already_indexed: 0,
            anomalies: 0,
            failures: 0,
        }
    }
}

impl IngestOutcome {
    /// Sermons that were present before this run.
    pub fn skipped(&self) -> usize {
        self.already_saved + self.already_indexed
    }

    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
