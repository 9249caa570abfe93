//! Multi-keyword aggregation with dedup and a global job budget.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::models::{resolve_link, JobRecord, ListingItem, DEFAULT_FIELD_VALUE};
use crate::scrapers::SiteConfig;

/// Produces raw listing items for a keyword.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self, keyword: &str, remaining_budget: usize) -> Vec<ListingItem>;
}

/// Produces the description text for one listing.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn detail_content(&self, item: &ListingItem, link: &str) -> String;
}

/// Turns listings from several keywords into at most `max_jobs` unique records.
pub struct Aggregator<'a> {
    site: &'a SiteConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(site: &'a SiteConfig) -> Self {
        Self { site }
    }

    /// Walk `keywords` in order, collecting records until the budget is spent.
    ///
    /// Items without a usable link and links already seen this run are skipped
    /// without touching the detail source. Once the budget is reached no further
    /// listing or detail work is started.
    pub async fn aggregate(
        &self,
        listings: &dyn ListingSource,
        details: &dyn DetailSource,
        keywords: &[String],
        max_jobs: usize,
    ) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for keyword in keywords {
            if jobs.len() >= max_jobs {
                break;
            }

            let items = listings.fetch_listings(keyword, max_jobs - jobs.len()).await;

            for item in items {
                if jobs.len() >= max_jobs {
                    break;
                }

                let title = item.job_name().unwrap_or(DEFAULT_FIELD_VALUE).to_string();

                let Some(link) = resolve_link(item.job_url(), &self.site.base_url) else {
                    debug!("Skipping '{}': no usable link", title);
                    continue;
                };

                if !seen.insert(link.clone()) {
                    debug!("Skipping duplicate: {}", link);
                    continue;
                }

                let raw_content = if self.needs_detail(&item) {
                    info!("Fetching details: {}", title);
                    details.detail_content(&item, &link).await
                } else {
                    debug!("Listing description is sufficient for '{}'", title);
                    item.description().to_string()
                };

                jobs.push(JobRecord::from_listing(
                    &item,
                    link,
                    &raw_content,
                    &self.site.source_tag,
                ));
            }
        }

        info!("Collected {} jobs across {} keywords", jobs.len(), keywords.len());
        jobs
    }

    fn needs_detail(&self, item: &ListingItem) -> bool {
        match self.site.detail_min_chars {
            None => true,
            Some(min) => item.description().trim().chars().count() < min,
        }
    }
}
