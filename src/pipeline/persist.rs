// src/pipeline/persist.rs

//! Saving one sermon to the index and the content store.

use crate::error::{AppError, Result};
use crate::models::{AddOutcome, SermonRecord};
use crate::storage::{InsertOutcome, Storage, WriteOutcome};
use crate::utils::normalize_name;

/// Persist a sermon exactly once.
///
/// The content file is checked first: if it exists the index is not touched.
/// Otherwise the index row is inserted, and only a fresh insert writes the
/// file. If writing fails the row stays behind as an orphan for the
/// reconcile pass.
pub async fn add_sermon(
    storage: &Storage,
    title: &str,
    author: &str,
    link: &str,
    text: &str,
) -> Result<AddOutcome> {
    require("title", title, link)?;
    require("author", author, link)?;
    require("link", link, title)?;
    require("sermon text", text, link)?;

    let record = SermonRecord::new(normalize_name(author)?, normalize_name(title)?, link);

    if storage.content.exists(&record.author, &record.title).await? {
        log::info!("{} by {} already saved in files", record.title, record.author);
        return Ok(AddOutcome::AlreadySaved(record));
    }

    if storage.index.insert(&record).await? == InsertOutcome::AlreadyExists {
        log::info!("{} by {} already in database", record.title, record.author);
        return Ok(AddOutcome::AlreadyIndexed(record));
    }

    match storage
        .content
        .write(&record.author, &record.title, text)
        .await?
    {
        WriteOutcome::Written(path) => {
            log::info!("Saved {} by {} to {}", record.title, record.author, path.display());
            Ok(AddOutcome::Written(record))
        }
        WriteOutcome::AlreadySaved(_) => {
            log::info!("{} by {} already saved in files", record.title, record.author);
            Ok(AddOutcome::AlreadySaved(record))
        }
    }
}

fn require(field: &'static str, value: &str, context: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::missing_field(field, context));
    }
    Ok(())
}
