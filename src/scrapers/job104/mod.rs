//! Scraper for 104.com.tw job search.
//!
//! One browser session per run: a single search page is reused across
//! keywords to capture the listing API, and each detail page gets its own tab
//! that is closed as soon as its description is read. When the live scrape
//! finds nothing, records are loaded from a local sample file instead.

mod aggregate;
mod detail;
mod fallback;
mod listing;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

pub use aggregate::{Aggregator, DetailSource, ListingSource};
pub use detail::{extract_description, DetailEnricher};
pub use fallback::load_sample_data;
pub use listing::{parse_listing_payload, ListingFetcher};

use super::browser::{BrowserEngineConfig, BrowserSession, ChromiumLauncher, SessionLauncher};
use super::{JobScraper, ScrapeError, SiteConfig};
use crate::models::JobRecord;

pub struct Job104Scraper {
    site: SiteConfig,
    launcher: Arc<dyn SessionLauncher>,
    sample_data: PathBuf,
}

impl Job104Scraper {
    /// Scraper backed by a real Chromium session.
    pub fn new(site: SiteConfig, browser: BrowserEngineConfig, sample_data: PathBuf) -> Self {
        Self::with_launcher(site, Arc::new(ChromiumLauncher::new(browser)), sample_data)
    }

    pub fn with_launcher(
        site: SiteConfig,
        launcher: Arc<dyn SessionLauncher>,
        sample_data: PathBuf,
    ) -> Self {
        Self {
            site,
            launcher,
            sample_data,
        }
    }

    async fn scrape_live(
        &self,
        session: &dyn BrowserSession,
        keywords: &[String],
        max_jobs: usize,
    ) -> Vec<JobRecord> {
        let search_page = match session.open_page().await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to open search page: {}", e);
                return Vec::new();
            }
        };

        let listings = ListingFetcher::new(&self.site, search_page.as_ref());
        let details = DetailEnricher::new(&self.site, session);
        let jobs = Aggregator::new(&self.site)
            .aggregate(&listings, &details, keywords, max_jobs)
            .await;

        search_page.close().await;
        jobs
    }
}

#[async_trait]
impl JobScraper for Job104Scraper {
    fn source_tag(&self) -> &str {
        &self.site.source_tag
    }

    async fn scrape(
        &self,
        keywords: &[String],
        max_jobs: usize,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let session = self.launcher.launch().await?;
        let jobs = self.scrape_live(session.as_ref(), keywords, max_jobs).await;
        session.close().await;

        if !jobs.is_empty() {
            info!("Scraped {} jobs from {}", jobs.len(), self.site.base_url);
            return Ok(jobs);
        }

        warn!(
            "No jobs found live, falling back to sample data at {}",
            self.sample_data.display()
        );
        Ok(load_sample_data(&self.sample_data, &self.site).await)
    }
}
