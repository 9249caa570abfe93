//! Raw listing items as they arrive from the search API or the sample dataset.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// One entry from the search-results payload, before normalization.
///
/// The payload is kept as raw JSON so that any deviation from the expected
/// shape degrades to default values instead of failing the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingItem(Value);

impl ListingItem {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Job title (`jobName`).
    pub fn job_name(&self) -> Option<&str> {
        self.text("jobName")
    }

    /// Company name (`custName`).
    pub fn company_name(&self) -> Option<&str> {
        self.text("custName")
    }

    /// Work location without the detailed address (`jobAddrNoDesc`).
    pub fn location(&self) -> Option<&str> {
        self.text("jobAddrNoDesc")
    }

    /// Posting date as supplied by the site (`appearDate`), unparsed.
    pub fn appear_date(&self) -> Option<&str> {
        self.text("appearDate")
    }

    /// Raw posting URL (`link.jobUrl`), possibly scheme-relative.
    pub fn job_url(&self) -> Option<&str> {
        self.0
            .get("link")
            .and_then(|link| link.get("jobUrl"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Listing description snippet. Missing or non-string maps to "".
    pub fn description(&self) -> &str {
        self.0
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }

    /// Salary range formatted as `"{low} - {high}"`, missing bounds as 0.
    pub fn salary_range(&self) -> String {
        format!(
            "{} - {}",
            self.number_text("salaryLow"),
            self.number_text("salaryHigh")
        )
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn number_text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => "0".to_string(),
        }
    }
}

/// Resolve a raw posting URL into an absolute, scheme-qualified link.
///
/// - `//host/path` becomes `https://host/path`
/// - `http://` and `https://` URLs are kept as-is
/// - site-relative paths are joined onto `base_url`
///
/// Returns `None` for empty input or anything that does not end up as an
/// http(s) URL.
pub fn resolve_link(raw: Option<&str>, base_url: &str) -> Option<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }

    match Url::parse(raw) {
        Ok(url) if is_web_scheme(&url) => Some(raw.to_string()),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let joined = Url::parse(base_url).ok()?.join(raw).ok()?;
            is_web_scheme(&joined).then(|| joined.to_string())
        }
        Err(_) => None,
    }
}

fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://www.104.com.tw";

    #[test]
    fn test_resolve_scheme_relative_link() {
        assert_eq!(
            resolve_link(Some("//example.com/job/1"), BASE).as_deref(),
            Some("https://example.com/job/1")
        );
    }

    #[test]
    fn test_resolve_absolute_link_unchanged() {
        assert_eq!(
            resolve_link(Some("https://www.104.com.tw/job/7abc"), BASE).as_deref(),
            Some("https://www.104.com.tw/job/7abc")
        );
    }

    #[test]
    fn test_resolve_site_relative_link() {
        assert_eq!(
            resolve_link(Some("/job/7abc"), BASE).as_deref(),
            Some("https://www.104.com.tw/job/7abc")
        );
    }

    #[test]
    fn test_resolve_rejects_empty_and_non_web() {
        assert_eq!(resolve_link(None, BASE), None);
        assert_eq!(resolve_link(Some("   "), BASE), None);
        assert_eq!(resolve_link(Some("javascript:void(0)"), BASE), None);
        assert_eq!(resolve_link(Some("mailto:hr@example.com"), BASE), None);
    }

    #[test]
    fn test_salary_range_accepts_numbers_and_strings() {
        let item = ListingItem::new(json!({"salaryLow": 40000, "salaryHigh": "60000"}));
        assert_eq!(item.salary_range(), "40000 - 60000");

        let item = ListingItem::new(json!({}));
        assert_eq!(item.salary_range(), "0 - 0");
    }

    #[test]
    fn test_accessors_tolerate_wrong_types() {
        let item = ListingItem::new(json!({
            "jobName": 42,
            "link": "not-an-object",
            "description": null,
        }));
        assert_eq!(item.job_name(), None);
        assert_eq!(item.job_url(), None);
        assert_eq!(item.description(), "");
    }
}
