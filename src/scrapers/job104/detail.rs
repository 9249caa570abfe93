//! Detail-page description scraping.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::aggregate::DetailSource;
use crate::models::ListingItem;
use crate::scrapers::browser::{BrowserError, BrowserSession, SessionPage};
use crate::scrapers::SiteConfig;

/// Opens each posting's own page and reads the full description.
pub struct DetailEnricher<'a> {
    site: &'a SiteConfig,
    session: &'a dyn BrowserSession,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(site: &'a SiteConfig, session: &'a dyn BrowserSession) -> Self {
        Self { site, session }
    }

    /// Description text for `item`, read from the page at `link`.
    ///
    /// Falls back to the listing's own (trimmed) description when no selector
    /// matches or anything goes wrong. The detail page is closed on every path.
    pub async fn enrich_with_detail(&self, item: &ListingItem, link: &str) -> String {
        let fallback = item.description().trim().to_string();

        let page = match self.session.open_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!("Detail fetch failed for {}: {}", link, e);
                return fallback;
            }
        };

        let result = self.read_description(page.as_ref(), link).await;
        page.close().await;

        match result {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("No description selector matched on {}", link);
                fallback
            }
            Err(e) => {
                warn!("Detail fetch failed for {}: {}", link, e);
                fallback
            }
        }
    }

    async fn read_description(
        &self,
        page: &dyn SessionPage,
        link: &str,
    ) -> Result<Option<String>, BrowserError> {
        page.navigate(link, self.site.detail_timeout()).await?;

        let pause = self.pacing_delay();
        debug!("Waiting {:?} before reading {}", pause, link);
        tokio::time::sleep(pause).await;

        let html = page.content().await?;
        Ok(extract_description(&html, &self.site.detail_selectors))
    }

    /// Random pause within the configured bounds.
    fn pacing_delay(&self) -> Duration {
        let (min, max) = self.site.detail_delay_bounds();
        if min == max {
            return min;
        }
        let millis = rand::rng().random_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[async_trait]
impl<'a> DetailSource for DetailEnricher<'a> {
    async fn detail_content(&self, item: &ListingItem, link: &str) -> String {
        self.enrich_with_detail(item, link).await
    }
}

/// Text of the first element matched by `selectors`, tried in order.
///
/// The first selector that matches anything wins, even if its text is empty.
pub fn extract_description(html: &str, selectors: &[String]) -> Option<String> {
    let document = Html::parse_document(html);

    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            warn!("Ignoring invalid selector: {}", selector_str);
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            return Some(element.text().collect::<String>().trim().to_string());
        }
    }

    None
}
