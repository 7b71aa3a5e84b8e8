// src/pipeline/status.rs

//! Index summary.

use crate::error::Result;
use crate::storage::Storage;

/// Snapshot of what has been saved so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub rows: i64,
    pub files: usize,
    pub authors: Vec<(String, i64)>,
}

pub async fn collect_status(storage: &Storage) -> Result<StatusReport> {
    Ok(StatusReport {
        rows: storage.index.count().await?,
        files: storage.content.file_count().await?,
        authors: storage.index.author_counts().await?,
    })
}

/// Collect and log the index summary.
pub async fn run_status(storage: &Storage) -> Result<StatusReport> {
    let report = collect_status(storage).await?;

    log::info!("Sermons in index: {}", report.rows);
    log::info!(
        "Sermon files under {}: {}",
        storage.content.root().display(),
        report.files
    );
    for (author, count) in &report.authors {
        log::info!("    {}: {}", author, count);
    }
    if report.files as i64 != report.rows {
        log::info!("Index and files differ; run --clean_db to drop rows without files");
    }

    Ok(report)
}
