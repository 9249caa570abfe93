//! Job board scrapers.

pub mod browser;
pub mod config;
pub mod job104;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use browser::{BrowserEngineConfig, BrowserError};
pub use config::SiteConfig;
pub use job104::Job104Scraper;

use crate::models::JobRecord;

/// Errors that abort a scrape run.
///
/// Per-keyword and per-job failures never surface here; they are logged and
/// skipped inside the scraper.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("Unknown source '{0}'")]
    UnknownSource(String),
}

/// A job board that turns search keywords into normalized records.
#[async_trait]
pub trait JobScraper: Send + Sync {
    /// Tag stored in each record's `source` field.
    fn source_tag(&self) -> &str;

    /// Scrape up to `max_jobs` unique postings across `keywords`.
    async fn scrape(
        &self,
        keywords: &[String],
        max_jobs: usize,
    ) -> Result<Vec<JobRecord>, ScrapeError>;
}

/// Scrapers available to a run, keyed by source tag.
#[derive(Default)]
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn JobScraper>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in scrapers.
    pub fn with_defaults(
        site: &SiteConfig,
        browser: &BrowserEngineConfig,
        sample_data: &Path,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Job104Scraper::new(
            site.clone(),
            browser.clone(),
            sample_data.to_path_buf(),
        )));
        registry
    }

    /// Add a scraper, replacing any with the same tag.
    pub fn register(&mut self, scraper: Arc<dyn JobScraper>) {
        self.scrapers
            .insert(scraper.source_tag().to_string(), scraper);
    }

    pub fn get(&self, source: &str) -> Result<Arc<dyn JobScraper>, ScrapeError> {
        self.scrapers
            .get(source)
            .cloned()
            .ok_or_else(|| ScrapeError::UnknownSource(source.to_string()))
    }

    /// Registered tags, sorted.
    pub fn sources(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.scrapers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
