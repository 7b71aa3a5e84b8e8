// src/services/sermons.rs

//! Sermon page parsing.
//!
//! Listing pages yield `(title, link)` pairs; sermon pages yield the body
//! text with the embedded heading removed. Parsing is synchronous: the
//! pipeline fetches HTML as a string and hands it over here.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ListingEntry, SelectorConfig};
use crate::utils::{resolve_url, squash_whitespace};

/// Compiled selectors for the sermon archive.
#[derive(Debug, Clone)]
pub struct SermonParser {
    row: Selector,
    link: Selector,
    attr_name: String,
    body: Selector,
    heading: Selector,
}

impl SermonParser {
    /// Compile the configured selectors.
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            row: Self::parse_selector(&selectors.row_selector)?,
            link: Self::parse_selector(&selectors.link_selector)?,
            attr_name: selectors.attr_name.clone(),
            body: Self::parse_selector(&selectors.body_selector)?,
            heading: Self::parse_selector(&selectors.heading_selector)?,
        })
    }

    /// Extract every sermon announced on a listing page.
    ///
    /// Rows without a link element are skipped. Relative links are resolved
    /// against `page_url`.
    pub fn parse_listing(&self, html: &str, page_url: &str) -> Result<Vec<ListingEntry>> {
        let document = Html::parse_document(html);
        let base_url = Url::parse(page_url)?;

        let entries = document
            .select(&self.row)
            .filter_map(|row| self.parse_row(&row, &base_url))
            .collect();
        Ok(entries)
    }

    fn parse_row(&self, row: &ElementRef, base_url: &Url) -> Option<ListingEntry> {
        let link_elem = row.select(&self.link).next()?;
        let href = link_elem.value().attr(&self.attr_name)?.trim();
        if href.is_empty() {
            return None;
        }

        let raw_title: String = link_elem.text().collect();
        Some(ListingEntry {
            title: squash_whitespace(&raw_title),
            link: resolve_url(base_url, href),
        })
    }

    /// Extract the sermon text from a sermon page.
    ///
    /// The page must contain exactly one content body. The first heading
    /// inside it is left out, non-breaking spaces become spaces and leading
    /// whitespace is stripped.
    pub fn extract_text(&self, html: &str, link: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let bodies: Vec<ElementRef> = document.select(&self.body).collect();
        let [body] = bodies.as_slice() else {
            return Err(AppError::Extraction {
                link: link.to_string(),
                found: bodies.len(),
            });
        };

        let heading = body.select(&self.heading).next().map(|h| h.id());
        let mut text = String::new();
        for node in body.descendants() {
            let Some(chunk) = node.value().as_text() else {
                continue;
            };
            if heading.is_some() && node.ancestors().any(|a| Some(a.id()) == heading) {
                continue;
            }
            text.push_str(chunk);
        }

        Ok(clean_text(&text))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Replace non-breaking spaces and strip leading whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace('\u{a0}', " ").trim_start().to_string()
}
