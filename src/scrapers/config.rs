//! Site-specific scraper configuration.
//!
//! Everything that ties the scraper to one job board lives here: URLs, the
//! listing API marker, detail-page selectors and pacing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the 104.com.tw scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Tag written to every record's `source` field.
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
    /// Site root, used for relative links and as the sample-data link default.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Search page URL; `{keyword}` is replaced with the URL-encoded keyword.
    #[serde(default = "default_search_url")]
    pub search_url: String,
    /// Substring identifying the internal listing API response.
    #[serde(default = "default_listing_api_marker")]
    pub listing_api_marker: String,
    /// Seconds to wait for the listing API response.
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,
    /// Seconds to wait for a detail page to load.
    #[serde(default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,
    /// Lower bound of the pause before reading a detail page, in milliseconds.
    #[serde(default = "default_detail_delay_min")]
    pub detail_delay_min_ms: u64,
    /// Upper bound of the pause before reading a detail page, in milliseconds.
    #[serde(default = "default_detail_delay_max")]
    pub detail_delay_max_ms: u64,
    /// Description selectors tried in order; the first present element wins.
    #[serde(default = "default_detail_selectors")]
    pub detail_selectors: Vec<String>,
    /// Skip the detail page when the listing description already has at
    /// least this many characters. Unset fetches every detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_min_chars: Option<usize>,
}

fn default_source_tag() -> String {
    "104".to_string()
}

fn default_base_url() -> String {
    "https://www.104.com.tw".to_string()
}

fn default_search_url() -> String {
    "https://www.104.com.tw/jobs/search/?keyword={keyword}&jobsource=index_s&ro=0&mode=s&order=11"
        .to_string()
}

fn default_listing_api_marker() -> String {
    "jobs/search/api".to_string()
}

fn default_listing_timeout() -> u64 {
    15
}

fn default_detail_timeout() -> u64 {
    30
}

fn default_detail_delay_min() -> u64 {
    2000
}

fn default_detail_delay_max() -> u64 {
    4000
}

fn default_detail_selectors() -> Vec<String> {
    vec![
        "p.job-description__content".to_string(),
        "div.job-description-table".to_string(),
    ]
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_tag: default_source_tag(),
            base_url: default_base_url(),
            search_url: default_search_url(),
            listing_api_marker: default_listing_api_marker(),
            listing_timeout_secs: default_listing_timeout(),
            detail_timeout_secs: default_detail_timeout(),
            detail_delay_min_ms: default_detail_delay_min(),
            detail_delay_max_ms: default_detail_delay_max(),
            detail_selectors: default_detail_selectors(),
            detail_min_chars: None,
        }
    }
}

impl SiteConfig {
    /// Search page URL for a keyword.
    pub fn search_url_for(&self, keyword: &str) -> String {
        self.search_url
            .replace("{keyword}", &urlencoding::encode(keyword))
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    /// Detail pacing bounds as (min, max), with max never below min.
    pub fn detail_delay_bounds(&self) -> (Duration, Duration) {
        let min = self.detail_delay_min_ms;
        let max = self.detail_delay_max_ms.max(min);
        (Duration::from_millis(min), Duration::from_millis(max))
    }
}
