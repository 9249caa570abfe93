//! Browser engine configuration types.

use serde::{Deserialize, Serialize};

/// Desktop Chrome user agent presented to the job site.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Apply the anti-detection init scripts to every page (default: true).
    #[serde(default = "default_stealth")]
    pub stealth: bool,

    /// User agent override applied to every page of the session.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Timeout in seconds for DevTools requests.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

fn default_headless() -> bool {
    true
}

fn default_stealth() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            stealth: default_stealth(),
            user_agent: default_user_agent(),
            proxy: None,
            timeout: default_timeout(),
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL`: remote DevTools endpoint
    /// - `BROWSER_HEADLESS`: "false" or "0" to show the window
    /// - `BROWSER_USER_AGENT`: user agent override
    /// - `SOCKS_PROXY`: proxy server for browser traffic
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("BROWSER_URL") {
            if !url.trim().is_empty() {
                self.remote_url = Some(url.trim().to_string());
            }
        }
        if let Ok(val) = std::env::var("BROWSER_HEADLESS") {
            self.headless = !(val.eq_ignore_ascii_case("false") || val == "0");
        }
        if let Ok(ua) = std::env::var("BROWSER_USER_AGENT") {
            if !ua.trim().is_empty() {
                self.user_agent = ua;
            }
        }
        if let Ok(proxy) = std::env::var("SOCKS_PROXY") {
            if !proxy.trim().is_empty() {
                self.proxy = Some(proxy);
            }
        }
        self
    }
}
