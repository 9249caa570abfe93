//! Listing capture from the search results page.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::aggregate::ListingSource;
use crate::models::ListingItem;
use crate::scrapers::browser::SessionPage;
use crate::scrapers::SiteConfig;

/// Drives the shared search page and harvests the listing API payload.
pub struct ListingFetcher<'a> {
    site: &'a SiteConfig,
    page: &'a dyn SessionPage,
}

impl<'a> ListingFetcher<'a> {
    pub fn new(site: &'a SiteConfig, page: &'a dyn SessionPage) -> Self {
        Self { site, page }
    }

    /// Fetch raw listing items for one keyword.
    ///
    /// Never fails: a timeout, navigation error or malformed payload is logged
    /// and yields no items, so the caller moves on to the next keyword.
    /// `remaining_budget` is only reported.
    pub async fn fetch_listings(&self, keyword: &str, remaining_budget: usize) -> Vec<ListingItem> {
        let url = self.site.search_url_for(keyword);
        info!(
            "Starting scrape for keyword '{}' (remaining budget: {})",
            keyword, remaining_budget
        );

        let body = match self
            .page
            .capture_response(
                &url,
                &self.site.listing_api_marker,
                self.site.listing_timeout(),
            )
            .await
        {
            Ok(body) => body,
            Err(e) => {
                error!("Error scraping '{}': {}", keyword, e);
                return Vec::new();
            }
        };

        match parse_listing_payload(&body) {
            Ok(items) => {
                info!("Extracted {} items from listing API", items.len());
                items
            }
            Err(e) => {
                warn!("Failed to parse listing JSON for '{}': {}", keyword, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<'a> ListingSource for ListingFetcher<'a> {
    async fn fetch_listings(&self, keyword: &str, remaining_budget: usize) -> Vec<ListingItem> {
        ListingFetcher::fetch_listings(self, keyword, remaining_budget).await
    }
}

/// Extract `data.list` from a listing API body.
///
/// Invalid JSON is an error; valid JSON without the nested list is treated as
/// an empty result.
pub fn parse_listing_payload(body: &str) -> Result<Vec<ListingItem>, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;

    let Some(list) = value
        .get("data")
        .and_then(|d| d.get("list"))
        .and_then(|l| l.as_array())
    else {
        debug!("Listing payload has no data.list array");
        return Ok(Vec::new());
    };

    Ok(list.iter().cloned().map(ListingItem::new).collect())
}
