// src/pipeline/reconcile.rs

//! Index cleanup.
//!
//! Removes index rows whose text file is gone, so that every row points at a
//! saved sermon. Files without a row are left alone.

use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::SermonRecord;
use crate::storage::Storage;

/// What a reconcile pass did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Rows inspected
    pub checked: usize,
    /// One record per (author, title) that was removed
    pub removed: Vec<SermonRecord>,
    /// Rows deleted, counting every link of a removed title
    pub rows_deleted: u64,
}

/// Delete every index row that has no text file behind it.
pub async fn run_reconcile(storage: &Storage) -> Result<ReconcileReport> {
    let records = storage.index.all().await?;
    let mut report = ReconcileReport {
        checked: records.len(),
        ..ReconcileReport::default()
    };
    let mut handled = HashSet::new();

    for record in records {
        let key = (record.author.clone(), record.title.clone());
        if handled.contains(&key) {
            continue;
        }

        let present = match storage.content.exists(&record.author, &record.title).await {
            Ok(present) => present,
            // No valid path means no file can exist for this row.
            Err(AppError::InvalidName(_)) => false,
            Err(e) => return Err(e),
        };
        if present {
            continue;
        }

        let deleted = storage.index.delete(&record.author, &record.title).await?;
        log::info!(
            "Removed {} by {} from the index ({} rows): no sermon file",
            record.title,
            record.author,
            deleted
        );
        handled.insert(key);
        report.rows_deleted += deleted;
        report.removed.push(record);
    }

    log::info!(
        "Reconcile checked {} rows, removed {}",
        report.checked,
        report.rows_deleted
    );
    Ok(report)
}
