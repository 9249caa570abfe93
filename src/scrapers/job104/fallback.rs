//! Offline sample data used when the live scrape yields nothing.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::models::{resolve_link, JobRecord, ListingItem};
use crate::scrapers::SiteConfig;

#[derive(Debug, Error)]
enum SampleDataError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load sample listings from a JSON array file.
///
/// Every item becomes a record, with the listing description as content and
/// the site root as the link when none is given. A missing or unreadable
/// file is logged and yields an empty list.
pub async fn load_sample_data(path: &Path, site: &SiteConfig) -> Vec<JobRecord> {
    let items = match read_sample_items(path).await {
        Ok(items) => items,
        Err(e) => {
            error!("Failed to load sample data from {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let jobs: Vec<JobRecord> = items
        .iter()
        .map(|item| {
            let link = resolve_link(item.job_url(), &site.base_url)
                .unwrap_or_else(|| site.base_url.clone());
            JobRecord::from_listing(item, link, item.description(), &site.source_tag)
        })
        .collect();

    info!("Loaded {} sample jobs from {}", jobs.len(), path.display());
    jobs
}

async fn read_sample_items(path: &Path) -> Result<Vec<ListingItem>, SampleDataError> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}
