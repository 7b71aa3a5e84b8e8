//! SQLite sermon index.
//!
//! One table, `sermons(author, title, link)`, unique over the whole triple.
//! Existence checks and deletion work on (author, title), which is the
//! granularity of content files.

use std::path::Path;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;
use crate::models::SermonRecord;

/// Result of an index insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Persistent index of saved sermons.
#[derive(Clone)]
pub struct SermonIndex {
    pool: SqlitePool,
}

impl SermonIndex {
    /// Open (creating if missing) the database at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        // Single writer: one connection keeps every statement in order.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the sermons table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sermons (
                author TEXT NOT NULL,
                title TEXT NOT NULL,
                link TEXT NOT NULL,
                UNIQUE(author, title, link)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sermons_author_title ON sermons(author, title)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a record unless the identical triple is already present.
    pub async fn insert(&self, record: &SermonRecord) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO sermons (author, title, link) VALUES (?, ?, ?) \
             ON CONFLICT(author, title, link) DO NOTHING",
        )
        .bind(&record.author)
        .bind(&record.title)
        .bind(&record.link)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Whether any row has this author and title.
    pub async fn exists(&self, author: &str, title: &str) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sermons WHERE author = ? AND title = ?)",
        )
        .bind(author)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    /// Snapshot of every row, in insertion order.
    pub async fn all(&self) -> Result<Vec<SermonRecord>> {
        let rows = sqlx::query("SELECT author, title, link FROM sermons ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<SermonRecord> {
                Ok(SermonRecord {
                    author: row.try_get("author")?,
                    title: row.try_get("title")?,
                    link: row.try_get("link")?,
                })
            })
            .collect()
    }

    /// Links stored for an author and title.
    pub async fn links(&self, author: &str, title: &str) -> Result<Vec<String>> {
        let links = sqlx::query_scalar(
            "SELECT link FROM sermons WHERE author = ? AND title = ? ORDER BY rowid",
        )
        .bind(author)
        .bind(title)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sermons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Row count per author, largest first.
    pub async fn author_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT author, COUNT(*) AS n FROM sermons GROUP BY author ORDER BY n DESC, author",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(String, i64)> {
                Ok((row.try_get("author")?, row.try_get("n")?))
            })
            .collect()
    }

    /// Remove every row for an author and title. Returns the rows removed.
    pub async fn delete(&self, author: &str, title: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM sermons WHERE author = ? AND title = ?")
            .bind(author)
            .bind(title)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Remove every row.
    pub async fn clear(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM sermons")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
