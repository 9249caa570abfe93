//! The normalized job record that flows through scraping, enrichment and
//! persistence.

use serde::{Deserialize, Serialize};

use super::listing::ListingItem;

/// Value used for descriptive fields the source did not supply.
pub const DEFAULT_FIELD_VALUE: &str = "Unknown";

/// A normalized job posting.
///
/// Identity and descriptive fields are fixed at construction; only the
/// enrichment fields are mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    title: String,
    company: String,
    salary: String,
    location: String,
    link: String,
    source: String,
    posted_date: Option<String>,
    raw_content: String,

    /// Technologies named in the posting, in the order the model returned them.
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Resume fit on a 0.0 - 10.0 scale. `None` until scored.
    #[serde(default)]
    pub match_score: Option<f64>,
    /// Short model-written summary of the posting.
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

impl JobRecord {
    /// Build a record from a listing item whose link is already resolved.
    ///
    /// `raw_content` is trimmed; missing descriptive fields fall back to
    /// [`DEFAULT_FIELD_VALUE`].
    pub fn from_listing(item: &ListingItem, link: String, raw_content: &str, source: &str) -> Self {
        let or_default = |v: Option<&str>| v.unwrap_or(DEFAULT_FIELD_VALUE).to_string();

        Self {
            title: or_default(item.job_name()),
            company: or_default(item.company_name()),
            salary: item.salary_range(),
            location: or_default(item.location()),
            link,
            source: source.to_string(),
            posted_date: item.appear_date().map(String::from),
            raw_content: raw_content.trim().to_string(),
            tech_stack: Vec::new(),
            match_score: None,
            ai_summary: None,
            pros: Vec::new(),
            cons: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn salary(&self) -> &str {
        &self.salary
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Canonical posting URL; the deduplication key.
    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn posted_date(&self) -> Option<&str> {
        self.posted_date.as_deref()
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Whether the record has been through the enrichment stage.
    pub fn is_scored(&self) -> bool {
        self.match_score.is_some()
    }
}
