// src/pipeline/selftest.rs

//! `--test` fixtures.
//!
//! Saves known sermons into a scratch index and directory, checks the stored
//! row and file, then removes the scratch data.

use std::path::Path;

use crate::error::Result;
use crate::models::{AddOutcome, StorageConfig};
use crate::pipeline::persist::add_sermon;
use crate::storage::Storage;

const TEST_TEXT: &str = "This is a test sermon";
const TEST_LINK: &str = "sermons.com/jt";

/// One fixture run by the self test.
#[derive(Debug, Clone, Copy)]
struct Fixture {
    name: &'static str,
    title: &'static str,
    author: &'static str,
    expected_title: &'static str,
    expected_author: &'static str,
    /// Call `add_sermon` twice and expect the second call to be a no-op
    repeat: bool,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "Add Sermon Test",
        title: "God is Good",
        author: "John Tucker",
        expected_title: "god-is-good",
        expected_author: "john-tucker",
        repeat: false,
    },
    Fixture {
        name: "Add Weird Sermon Folder Name Test",
        title: "God is Good2Me",
        author: "John T--&3#$..      uck\"\"er",
        expected_title: "god-is-good2me",
        expected_author: "john-t3-ucker",
        repeat: false,
    },
    Fixture {
        name: "Add Sermon Twice Test",
        title: "God is Good",
        author: "John Tucker",
        expected_title: "god-is-good",
        expected_author: "john-tucker",
        repeat: true,
    },
];

/// Result of one fixture.
#[derive(Debug, Clone)]
pub struct SelfTestResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Run every fixture in its own directory under `scratch_dir`.
///
/// `scratch_dir` is removed afterwards.
pub async fn run_self_test(scratch_dir: &Path) -> Result<Vec<SelfTestResult>> {
    let mut results = Vec::new();

    for (i, fixture) in FIXTURES.iter().enumerate() {
        log::info!("{}", fixture.name);
        let storage = Storage::open(&StorageConfig::under(scratch_dir.join(i.to_string()))).await?;

        let result = run_fixture(&storage, fixture).await;

        storage.index.clear().await?;
        storage.close().await;

        let result = match result {
            Ok(()) => SelfTestResult {
                name: fixture.name,
                passed: true,
                detail: "Test passed".to_string(),
            },
            Err(detail) => SelfTestResult {
                name: fixture.name,
                passed: false,
                detail,
            },
        };
        if result.passed {
            log::info!("{}", result.detail);
        } else {
            log::error!("Test failed. {}", result.detail);
        }
        results.push(result);
    }

    if tokio::fs::try_exists(scratch_dir).await? {
        tokio::fs::remove_dir_all(scratch_dir).await?;
    }
    Ok(results)
}

async fn run_fixture(storage: &Storage, fixture: &Fixture) -> std::result::Result<(), String> {
    let add = || add_sermon(storage, fixture.title, fixture.author, TEST_LINK, TEST_TEXT);

    let first = add().await.map_err(|e| e.to_string())?;
    if !first.is_written() {
        return Err(format!("First add was not written: {first:?}"));
    }
    if fixture.repeat {
        let second = add().await.map_err(|e| e.to_string())?;
        if !matches!(second, AddOutcome::AlreadySaved(_)) {
            return Err(format!("Second add was not skipped: {second:?}"));
        }
    }

    let links = storage
        .index
        .links(fixture.expected_author, fixture.expected_title)
        .await
        .map_err(|e| e.to_string())?;
    if links != [TEST_LINK] {
        return Err(format!("Rows returned in query: {} {:?}", links.len(), links));
    }

    let text = storage
        .content
        .read(fixture.expected_author, fixture.expected_title)
        .await
        .map_err(|e| e.to_string())?;
    match text.as_deref() {
        Some(TEST_TEXT) => Ok(()),
        Some(other) => Err(format!(
            "Test failed with the following written to file:\n{other}"
        )),
        None => Err("No sermon file found".to_string()),
    }
}
