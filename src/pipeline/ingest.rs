// src/pipeline/ingest.rs

//! Sermon ingestion pipeline.
//!
//! Two stages, run one request at a time:
//! 1. Walk every listing page and collect `(title, link)` pairs.
//! 2. Fetch each sermon page, extract its text and save it with
//!    [`add_sermon`].
//!
//! A bad sermon page is logged with its link and skipped. Missing
//! required fields stop the run.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{AddOutcome, Config, IngestOutcome, ListingEntry, SermonRecord};
use crate::pipeline::persist::add_sermon;
use crate::services::SermonParser;
use crate::storage::Storage;
use crate::utils::http::PageFetcher;
use crate::utils::normalize_name;

/// Drives one ingestion run.
pub struct Ingestor<'a> {
    config: &'a Config,
    fetcher: &'a dyn PageFetcher,
    storage: &'a Storage,
    parser: SermonParser,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn PageFetcher,
        storage: &'a Storage,
    ) -> Result<Self> {
        Ok(Self {
            config,
            fetcher,
            storage,
            parser: SermonParser::new(&config.selectors)?,
        })
    }

    /// Run discovery then extraction for every discovered sermon.
    pub async fn run(&self) -> Result<IngestOutcome> {
        let mut outcome = IngestOutcome::default();

        let entries = self.discover(&mut outcome).await?;
        outcome.discovered = entries.len();
        log::info!(
            "Discovered {} sermons on {} listing pages",
            entries.len(),
            outcome.pages_fetched
        );

        for (i, entry) in entries.iter().enumerate() {
            log::debug!("[{}/{}] {}", i + 1, entries.len(), entry.link);

            match self.ingest_entry(entry).await {
                Ok(AddOutcome::Written(_)) => outcome.written += 1,
                Ok(AddOutcome::AlreadySaved(_)) => outcome.already_saved += 1,
                Ok(AddOutcome::AlreadyIndexed(_)) => outcome.already_indexed += 1,
                Err(error) if error.is_fatal() => {
                    log::error!("Stopping ingestion at {}: {}", entry.link, error);
                    return Err(error);
                }
                Err(error @ AppError::Extraction { .. }) => {
                    outcome.anomalies += 1;
                    log::warn!("{error}");
                }
                Err(error) => {
                    outcome.failures += 1;
                    log::warn!("Failed to ingest {}: {}", entry.link, error);
                }
            }
        }

        outcome.finished_at = Utc::now();
        Ok(outcome)
    }

    /// Collect the sermons listed on pages `1..=total_pages`.
    ///
    /// A page that cannot be fetched is logged and counted; links seen on an
    /// earlier page are not repeated.
    pub async fn discover(&self, outcome: &mut IngestOutcome) -> Result<Vec<ListingEntry>> {
        let source = &self.config.source;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for page in 1..=source.total_pages {
            if page > 1 {
                self.pause().await;
            }

            let page_url = source.page_url(page);
            let html = match self.fetcher.fetch_page(&page_url).await {
                Ok(html) => html,
                Err(error) => {
                    outcome.page_failures += 1;
                    log::warn!("Failed to fetch listing page {}: {}", page_url, error);
                    continue;
                }
            };
            outcome.pages_fetched += 1;

            let found = self.parser.parse_listing(&html, &page_url)?;
            log::info!(
                "Listing page {}/{}: {} sermons",
                page,
                source.total_pages,
                found.len()
            );

            for entry in found {
                if seen.insert(entry.link.clone()) {
                    entries.push(entry);
                }
            }
        }

        Ok(entries)
    }

    /// Fetch, extract and save one listed sermon.
    ///
    /// Sermons already in the index or on disk are skipped before any request
    /// is made.
    pub async fn ingest_entry(&self, entry: &ListingEntry) -> Result<AddOutcome> {
        let author = &self.config.source.author;
        if entry.title.trim().is_empty() {
            return Err(AppError::missing_field("title", &entry.link));
        }
        if entry.link.trim().is_empty() {
            return Err(AppError::missing_field("link", &entry.title));
        }
        if author.trim().is_empty() {
            return Err(AppError::missing_field("author", &entry.link));
        }

        let norm_author = normalize_name(author)?;
        let norm_title = normalize_name(&entry.title)?;
        if let Some(skipped) = self.already_present(&norm_author, &norm_title, entry).await? {
            return Ok(skipped);
        }

        self.pause().await;
        let html = self.fetcher.fetch_page(&entry.link).await?;
        let text = self.parser.extract_text(&html, &entry.link)?;

        add_sermon(self.storage, &entry.title, author, &entry.link, &text).await
    }

    async fn already_present(
        &self,
        author: &str,
        title: &str,
        entry: &ListingEntry,
    ) -> Result<Option<AddOutcome>> {
        let record = || SermonRecord::new(author, title, &entry.link);

        if self.storage.content.exists(author, title).await? {
            log::info!("{} by {} already saved in files", title, author);
            return Ok(Some(AddOutcome::AlreadySaved(record())));
        }
        if self.storage.index.exists(author, title).await? {
            log::info!("{} by {} already in database", title, author);
            return Ok(Some(AddOutcome::AlreadyIndexed(record())));
        }
        Ok(None)
    }

    async fn pause(&self) {
        let delay = self.config.crawler.request_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

/// Run the sermon ingestion pipeline and log a summary.
pub async fn run_ingest(
    config: &Config,
    fetcher: &dyn PageFetcher,
    storage: &Storage,
) -> Result<IngestOutcome> {
    log::info!(
        "Ingesting sermons by {} from {} listing pages",
        config.source.author,
        config.source.total_pages
    );

    let outcome = Ingestor::new(config, fetcher, storage)?.run().await?;

    log::info!(
        "Ingestion complete in {}s: {} written, {} already present, {} anomalies, {} failures",
        outcome.elapsed_secs(),
        outcome.written,
        outcome.skipped(),
        outcome.anomalies,
        outcome.failures
    );
    if outcome.page_failures > 0 {
        log::warn!("{} listing pages could not be fetched", outcome.page_failures);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::StorageConfig;

    /// Serves canned pages and records every request.
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<(String, Instant)>>,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        /// Time between each request and the one before it.
        fn gaps(&self) -> Vec<Duration> {
            let requests = self.requests.lock().unwrap();
            requests
                .windows(2)
                .map(|pair| pair[1].1.duration_since(pair[0].1))
                .collect()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), Instant::now()));
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::crawl(url, "404 Not Found"))
        }
    }

    fn listing(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<div class="latest-resources__row__single"><div><a href="{href}">{title}</a></div></div>"#
                )
            })
            .collect();
        format!("<html><body>{rows}</body></html>")
    }

    fn sermon(title: &str, body: &str) -> String {
        format!(
            r#"<html><body><div class="article__body__content"><h2>{title}</h2><p>{body}</p></div></body></html>"#
        )
    }

    fn config(tmp: &TempDir, pages: u32) -> Config {
        let mut config = Config::default();
        config.crawler.request_delay_ms = 0;
        config.source.listing_url = "https://sermons.test/list?page={page}".to_string();
        config.source.total_pages = pages;
        config.storage = StorageConfig::under(tmp.path());
        config
    }

    #[tokio::test]
    async fn test_ingests_across_pages() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 2);
        let storage = Storage::open(&config.storage).await.unwrap();
        let fetcher = FakeFetcher::default()
            .page(
                "https://sermons.test/list?page=1",
                &listing(&[("Grace Abounding", "/s/grace")]),
            )
            .page(
                "https://sermons.test/list?page=2",
                &listing(&[("The Sinner's Friend", "/s/friend"), ("Grace Abounding", "/s/grace")]),
            )
            .page("https://sermons.test/s/grace", &sermon("Grace Abounding", "Grace text"))
            .page("https://sermons.test/s/friend", &sermon("Friend", "Friend text"));

        let outcome = run_ingest(&config, &fetcher, &storage).await.unwrap();

        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.discovered, 2);
        assert_eq!(outcome.written, 2);
        assert_eq!(storage.index.count().await.unwrap(), 2);
        assert_eq!(
            storage
                .content
                .read("charles-spurgeon", "the-sinners-friend")
                .await
                .unwrap()
                .as_deref(),
            Some("Friend text")
        );
        assert_eq!(
            fetcher.requests(),
            vec![
                "https://sermons.test/list?page=1",
                "https://sermons.test/list?page=2",
                "https://sermons.test/s/grace",
                "https://sermons.test/s/friend",
            ]
        );
    }

    #[tokio::test]
    async fn test_one_bad_item_does_not_stop_the_run() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 1);
        let storage = Storage::open(&config.storage).await.unwrap();
        let fetcher = FakeFetcher::default()
            .page(
                "https://sermons.test/list?page=1",
                &listing(&[
                    ("Missing Page", "/s/missing"),
                    ("No Body", "/s/nobody"),
                    ("???", "/s/unnamed"),
                    ("Still Saved", "/s/saved"),
                ]),
            )
            .page("https://sermons.test/s/nobody", "<html><body><p>moved</p></body></html>")
            .page("https://sermons.test/s/saved", &sermon("Still Saved", "kept"));

        let outcome = run_ingest(&config, &fetcher, &storage).await.unwrap();

        assert_eq!(outcome.discovered, 4);
        assert_eq!(outcome.failures, 2);
        assert_eq!(outcome.anomalies, 1);
        assert_eq!(outcome.written, 1);
        assert_eq!(
            storage.index.links("charles-spurgeon", "still-saved").await.unwrap(),
            vec!["https://sermons.test/s/saved".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_run_fetches_nothing_new() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 1);
        let storage = Storage::open(&config.storage).await.unwrap();
        let fetcher = FakeFetcher::default()
            .page(
                "https://sermons.test/list?page=1",
                &listing(&[("Grace Abounding", "/s/grace")]),
            )
            .page("https://sermons.test/s/grace", &sermon("Grace Abounding", "Grace text"));

        run_ingest(&config, &fetcher, &storage).await.unwrap();
        let second = run_ingest(&config, &fetcher, &storage).await.unwrap();

        assert_eq!(second.written, 0);
        assert_eq!(second.already_saved, 1);
        assert_eq!(storage.index.count().await.unwrap(), 1);
        assert_eq!(
            fetcher
                .requests()
                .iter()
                .filter(|url| url.ends_with("/s/grace"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_empty_listing_title_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 1);
        let storage = Storage::open(&config.storage).await.unwrap();
        let fetcher = FakeFetcher::default()
            .page(
                "https://sermons.test/list?page=1",
                &listing(&[("", "/s/untitled"), ("Later", "/s/later")]),
            )
            .page("https://sermons.test/s/later", &sermon("Later", "text"));

        let err = run_ingest(&config, &fetcher, &storage).await.unwrap_err();

        assert!(matches!(err, AppError::MissingField { field: "title", .. }));
        assert_eq!(storage.index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_listing_page_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 2);
        let storage = Storage::open(&config.storage).await.unwrap();
        let fetcher = FakeFetcher::default()
            .page(
                "https://sermons.test/list?page=2",
                &listing(&[("Grace Abounding", "/s/grace")]),
            )
            .page("https://sermons.test/s/grace", &sermon("Grace Abounding", "Grace text"));

        let outcome = run_ingest(&config, &fetcher, &storage).await.unwrap();

        assert_eq!(outcome.page_failures, 1);
        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(outcome.written, 1);
    }

    #[tokio::test]
    async fn test_requests_are_spaced_by_the_delay() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp, 2);
        config.crawler.request_delay_ms = 40;
        let storage = Storage::open(&config.storage).await.unwrap();
        let fetcher = FakeFetcher::default()
            .page(
                "https://sermons.test/list?page=1",
                &listing(&[("Grace Abounding", "/s/grace")]),
            )
            .page(
                "https://sermons.test/list?page=2",
                &listing(&[("All of Grace", "/s/all")]),
            )
            .page("https://sermons.test/s/grace", &sermon("Grace Abounding", "One"))
            .page("https://sermons.test/s/all", &sermon("All of Grace", "Two"));

        let outcome = run_ingest(&config, &fetcher, &storage).await.unwrap();

        assert_eq!(outcome.written, 2);
        let gaps = fetcher.gaps();
        // page 1 -> page 2 -> first sermon -> second sermon
        assert_eq!(gaps.len(), 3);
        for gap in gaps {
            assert!(gap >= Duration::from_millis(40), "gap was {gap:?}");
        }
    }
}
