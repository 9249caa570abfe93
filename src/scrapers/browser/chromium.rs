//! chromiumoxide (CDP) implementation of the browser session.

#[cfg(feature = "browser")]
use std::path::PathBuf;
use std::sync::Arc;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use base64::Engine;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams,
    SetUserAgentOverrideParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

use super::{BrowserEngineConfig, BrowserError, BrowserSession, SessionLauncher};
#[cfg(feature = "browser")]
use super::{SessionPage, STEALTH_SCRIPTS};

/// Whether the session started its browser or attached to one already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
enum SessionOrigin {
    Launched,
    Attached,
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
impl SessionOrigin {
    fn from_config(config: &BrowserEngineConfig) -> Self {
        if config.remote_url.is_some() {
            Self::Attached
        } else {
            Self::Launched
        }
    }

    /// An attached browser belongs to someone else and must outlive the run.
    fn owns_browser(self) -> bool {
        self == Self::Launched
    }
}

/// Launches (or attaches to) a Chromium instance.
pub struct ChromiumLauncher {
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    config: BrowserEngineConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "browser")]
impl ChromiumLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    fn find_chrome() -> Result<PathBuf, BrowserError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(BrowserError::Launch(
            "Chrome/Chromium not found. Install chromium or set BROWSER_URL to a remote DevTools endpoint"
                .to_string(),
        ))
    }

    async fn launch_local(&self) -> Result<(Browser, Handler), BrowserError> {
        info!("Launching browser (headless={})", self.config.headless);

        let mut builder = BrowserConfig::builder().chrome_executable(Self::find_chrome()?);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder.build().map_err(BrowserError::Launch)?;

        Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }

    async fn connect_remote(&self, url: &str) -> Result<(Browser, Handler), BrowserError> {
        info!("Connecting to remote browser at {}", url);

        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(Duration::from_secs(self.config.timeout))
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("remote browser unreachable: {}", e)))?
            .json()
            .await
            .map_err(|e| BrowserError::Launch(format!("bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Launch("No webSocketDebuggerUrl in response".into()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        Browser::connect(ws_url)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        let origin = SessionOrigin::from_config(&self.config);
        let (browser, mut handler) = match self.config.remote_url.as_deref() {
            Some(remote_url) => self.connect_remote(remote_url).await?,
            None => self.launch_local().await?,
        };

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Arc::new(ChromiumSession {
            browser: Mutex::new(browser),
            handler_task,
            origin,
            user_agent: self.config.user_agent.clone(),
            stealth: self.config.stealth,
        }))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        Err(BrowserError::Unsupported)
    }
}

/// A launched browser plus the profile every page receives.
#[cfg(feature = "browser")]
struct ChromiumSession {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
    origin: SessionOrigin,
    user_agent: String,
    stealth: bool,
}

#[cfg(feature = "browser")]
impl ChromiumSession {
    async fn apply_profile(&self, page: &Page) -> Result<(), BrowserError> {
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(protocol)?;

        if self.stealth {
            for script in STEALTH_SCRIPTS {
                page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
                    script.to_string(),
                ))
                .await
                .map_err(protocol)?;
            }
        }

        // Response bodies are only retrievable with the Network domain enabled
        page.execute(EnableParams::default())
            .await
            .map_err(protocol)?;

        Ok(())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open_page(&self) -> Result<Box<dyn SessionPage>, BrowserError> {
        let page = {
            let browser = self.browser.lock().await;
            browser.new_page("about:blank").await.map_err(protocol)?
        };

        if let Err(e) = self.apply_profile(&page).await {
            let _ = page.close().await;
            return Err(e);
        }

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) {
        if self.origin.owns_browser() {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                debug!("Browser close returned error: {}", e);
            }
        }
        // Stopping the handler drops the DevTools connection
        self.handler_task.abort();
        info!("Browser session closed ({:?})", self.origin);
    }
}

#[cfg(feature = "browser")]
struct ChromiumPage {
    page: Page,
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionPage for ChromiumPage {
    async fn capture_response(
        &self,
        url: &str,
        url_marker: &str,
        deadline: Duration,
    ) -> Result<String, BrowserError> {
        // Subscribe before navigating so no event is missed
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(protocol)?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(protocol)?;

        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(BrowserError::Navigation)?;

        let capture = async {
            let nav = self
                .page
                .execute(nav_params)
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            if let Some(ref error_text) = nav.result.error_text {
                return Err(BrowserError::Navigation(format!("{} at {}", error_text, url)));
            }

            let request_id = loop {
                match responses.next().await {
                    Some(event) if event.response.url.contains(url_marker) => {
                        debug!("Captured response: {}", event.response.url);
                        break event.request_id.clone();
                    }
                    Some(_) => continue,
                    None => return Err(BrowserError::Protocol("response stream ended".into())),
                }
            };

            // The body is only available once loading has finished
            loop {
                match finished.next().await {
                    Some(event) if event.request_id == request_id => break,
                    Some(_) => continue,
                    None => return Err(BrowserError::Protocol("loading stream ended".into())),
                }
            }

            let body = self
                .page
                .execute(GetResponseBodyParams::new(request_id))
                .await
                .map_err(protocol)?;

            if body.result.base64_encoded {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(&body.result.body)
                    .map_err(|e| BrowserError::Protocol(format!("bad base64 body: {}", e)))?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            } else {
                Ok(body.result.body.clone())
            }
        };

        tokio::time::timeout(deadline, capture)
            .await
            .map_err(|_| BrowserError::Timeout(deadline))?
    }

    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(deadline, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation(e.to_string())),
            Err(_) => Err(BrowserError::Timeout(deadline)),
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(protocol)
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close page: {}", e);
        }
    }
}

#[cfg(feature = "browser")]
fn protocol(e: chromiumoxide::error::CdpError) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}
