//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Placeholder replaced by the page number in the listing URL.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where sermons are listed and who preached them
    #[serde(default)]
    pub source: SourceConfig,

    /// CSS selectors for listing and sermon pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Index and content file locations
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if !self.source.listing_url.contains(PAGE_PLACEHOLDER) {
            return Err(AppError::config(format!(
                "source.listing_url must contain {PAGE_PLACEHOLDER}"
            )));
        }
        if self.source.total_pages == 0 {
            return Err(AppError::config("source.total_pages must be > 0"));
        }
        if self.source.author.trim().is_empty() {
            return Err(AppError::config("source.author is empty"));
        }
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(AppError::config("storage.database_path is empty"));
        }
        if self.storage.sermons_dir.as_os_str().is_empty() {
            return Err(AppError::config("storage.sermons_dir is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay before each request in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// The sermon archive being scraped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listing page URL with a `{page}` placeholder
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Number of listing pages to walk, starting at 1
    #[serde(default = "defaults::total_pages")]
    pub total_pages: u32,

    /// Preacher credited for every sermon in the archive
    #[serde(default = "defaults::author")]
    pub author: String,
}

impl SourceConfig {
    /// URL of listing page `page` (1-based).
    pub fn page_url(&self, page: u32) -> String {
        self.listing_url
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::listing_url(),
            total_pages: defaults::total_pages(),
            author: defaults::author(),
        }
    }
}

/// CSS selectors for scraping the archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selector for each sermon row on a listing page
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Selector for the link element within a row
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// HTML attribute holding the sermon URL
    #[serde(default = "defaults::attr_name")]
    pub attr_name: String,

    /// Selector for the sermon body on a sermon page
    #[serde(default = "defaults::body_selector")]
    pub body_selector: String,

    /// Selector for the heading embedded in the body
    #[serde(default = "defaults::heading_selector")]
    pub heading_selector: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            row_selector: defaults::row_selector(),
            link_selector: defaults::link_selector(),
            attr_name: defaults::attr_name(),
            body_selector: defaults::body_selector(),
            heading_selector: defaults::heading_selector(),
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the sermon index
    #[serde(default = "defaults::database_path")]
    pub database_path: PathBuf,

    /// Root directory of the sermon text files
    #[serde(default = "defaults::sermons_dir")]
    pub sermons_dir: PathBuf,
}

impl StorageConfig {
    /// Storage rooted under `dir`, using the default file names.
    pub fn under(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            database_path: dir.join(defaults::database_path()),
            sermons_dir: dir.join(defaults::sermons_dir()),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: defaults::database_path(),
            sermons_dir: defaults::sermons_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "the_lords_bot".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        30
    }

    // Source defaults
    pub fn listing_url() -> String {
        "https://www.spurgeon.org/resource-library/sermons/?fwp_paged={page}".into()
    }
    pub fn total_pages() -> u32 {
        1
    }
    pub fn author() -> String {
        "Charles Spurgeon".into()
    }

    // Selector defaults
    pub fn row_selector() -> String {
        ".latest-resources__row__single".into()
    }
    pub fn link_selector() -> String {
        "div a".into()
    }
    pub fn attr_name() -> String {
        "href".into()
    }
    pub fn body_selector() -> String {
        ".article__body__content".into()
    }
    pub fn heading_selector() -> String {
        "h2".into()
    }

    // Storage defaults
    pub fn database_path() -> PathBuf {
        PathBuf::from("sermon_data.db")
    }
    pub fn sermons_dir() -> PathBuf {
        PathBuf::from("sermons")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_listing_without_placeholder() {
        let mut config = Config::default();
        config.source.listing_url = "https://example.com/sermons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pages() {
        let mut config = Config::default();
        config.source.total_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn page_url_substitutes_page_number() {
        let source = SourceConfig::default();
        assert_eq!(
            source.page_url(3),
            "https://www.spurgeon.org/resource-library/sermons/?fwp_paged=3"
        );
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            request_delay_ms = 0

            [source]
            total_pages = 12

            [storage]
            sermons_dir = "archive"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.crawler.user_agent, "the_lords_bot");
        assert_eq!(config.source.total_pages, 12);
        assert_eq!(config.source.author, "Charles Spurgeon");
        assert_eq!(config.storage.sermons_dir, PathBuf::from("archive"));
        assert_eq!(config.storage.database_path, PathBuf::from("sermon_data.db"));
        assert_eq!(config.selectors.body_selector, ".article__body__content");
    }

    #[test]
    fn load_or_default_survives_missing_file() {
        let config = Config::load_or_default("definitely/not/here.toml");
        assert_eq!(config.source.total_pages, 1);
    }
}
