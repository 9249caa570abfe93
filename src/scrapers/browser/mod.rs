//! Browser session used to drive the job site.
//!
//! A run launches exactly one session. Every page it opens shares the same
//! anti-detection profile (user agent override plus init scripts), so the
//! search page and all detail pages look like the same visitor.
//!
//! The traits here are the seam between the scraping logic and chromiumoxide;
//! the listing fetcher and detail enricher only ever see `SessionPage`.

mod chromium;
mod config;
#[cfg(test)]
pub(crate) mod mock;
mod stealth;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use chromium::ChromiumLauncher;
pub use config::{BrowserEngineConfig, DEFAULT_USER_AGENT};
pub use stealth::STEALTH_SCRIPTS;

/// Errors raised by browser operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("DevTools protocol error: {0}")]
    Protocol(String),

    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unsupported,
}

/// Starts a browser session.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError>;
}

/// A running browser with one anti-detection profile.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a new blank page with the session profile applied.
    async fn open_page(&self) -> Result<Box<dyn SessionPage>, BrowserError>;

    /// Shut the browser down. Pages still open are discarded.
    async fn close(&self);
}

/// A single browser tab.
#[async_trait]
pub trait SessionPage: Send + Sync {
    /// Navigate to `url` and return the body of the first network response
    /// whose URL contains `url_marker`.
    ///
    /// Whichever comes first wins: the matching response finishing, or
    /// `deadline` elapsing (`BrowserError::Timeout`).
    async fn capture_response(
        &self,
        url: &str,
        url_marker: &str,
        deadline: Duration,
    ) -> Result<String, BrowserError>;

    /// Navigate to `url`, failing with `BrowserError::Timeout` after `deadline`.
    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), BrowserError>;

    /// Current document HTML.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Close the tab. Errors are logged, not returned.
    async fn close(&self);
}
