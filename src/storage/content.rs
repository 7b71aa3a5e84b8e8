//! Sermon text files.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! └── {author}/
//!     └── {title}.txt
//! ```
//!
//! Both segments go through [`normalize_name`]. Files are write-once.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::utils::normalize_name;

/// Result of a content write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    AlreadySaved(PathBuf),
}

/// Filesystem store for sermon texts.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root_dir: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Path of the text file for a sermon.
    pub fn path(&self, author: &str, title: &str) -> Result<PathBuf> {
        let author = normalize_name(author)?;
        let title = normalize_name(title)?;
        Ok(self.root_dir.join(author).join(format!("{title}.txt")))
    }

    /// Whether the sermon's text file exists as a regular file.
    pub async fn exists(&self, author: &str, title: &str) -> Result<bool> {
        let path = self.path(author, title)?;
        Self::is_file(&path).await
    }

    /// Write the sermon text unless a file is already there.
    ///
    /// The text goes to a sibling `.tmp` file first and is hard-linked into
    /// place, so the final path only ever holds a complete text and an
    /// existing file is never replaced.
    pub async fn write(&self, author: &str, title: &str, text: &str) -> Result<WriteOutcome> {
        let path = self.path(author, title)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("txt.tmp");
        if let Err(e) = Self::write_tmp(&tmp, text).await {
            Self::remove_tmp(&tmp).await;
            return Err(e);
        }

        let linked = tokio::fs::hard_link(&tmp, &path).await;
        Self::remove_tmp(&tmp).await;

        match linked {
            Ok(()) => Ok(WriteOutcome::Written(path)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if Self::is_file(&path).await? {
                    Ok(WriteOutcome::AlreadySaved(path))
                } else {
                    Err(AppError::Io(e))
                }
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_tmp(tmp: &Path, text: &str) -> Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn remove_tmp(tmp: &Path) {
        if let Err(e) = tokio::fs::remove_file(tmp).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove {}: {}", tmp.display(), e);
        }
    }

    /// Read a sermon text, returning None if it was never saved.
    pub async fn read(&self, author: &str, title: &str) -> Result<Option<String>> {
        let path = self.path(author, title)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Number of `.txt` files one level below the author directories.
    pub async fn file_count(&self) -> Result<usize> {
        let mut authors = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut count = 0;
        while let Some(author) = authors.next_entry().await? {
            if !author.file_type().await?.is_dir() {
                continue;
            }
            let mut files = tokio::fs::read_dir(author.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let is_txt = file.path().extension().is_some_and(|ext| ext == "txt");
                if is_txt && file.file_type().await?.is_file() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    async fn is_file(path: &Path) -> Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
