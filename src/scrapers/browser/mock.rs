//! Scripted in-memory browser session for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserError, BrowserSession, SessionLauncher, SessionPage};

/// How a mocked page behaves once navigated to.
#[derive(Debug, Clone)]
pub(crate) enum PageScript {
    Html(String),
    NavigationFails,
    ContentFails,
    NeverLoads,
}

/// Network responses a navigation produces, as (response URL, body) in
/// arrival order.
type ResponseScript = Vec<(String, String)>;

/// URL the listing API answers on in scripted searches.
const LISTING_API_URL: &str = "https://www.104.com.tw/jobs/search/api/jobs";

#[derive(Default)]
struct MockState {
    captures: Vec<(String, ResponseScript)>,
    pages: HashMap<String, PageScript>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    session_closed: AtomicBool,
}

/// A browser session whose pages replay canned responses.
#[derive(Clone, Default)]
pub(crate) struct MockSession {
    state: Arc<MockState>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigating to a URL containing `url_part` yields one listing API
    /// response carrying `body`.
    pub fn with_capture(self, url_part: &str, body: &str) -> Self {
        let api_url = format!("{}?{}", LISTING_API_URL, url_part);
        self.with_responses(url_part, &[(api_url.as_str(), body)])
    }

    /// Navigating to a URL containing `url_part` yields `responses` in order.
    pub fn with_responses(mut self, url_part: &str, responses: &[(&str, &str)]) -> Self {
        let script = responses
            .iter()
            .map(|(url, body)| (url.to_string(), body.to_string()))
            .collect();
        Arc::get_mut(&mut self.state)
            .expect("configure before sharing")
            .captures
            .push((url_part.to_string(), script));
        self
    }

    pub fn with_page(mut self, url: &str, script: PageScript) -> Self {
        Arc::get_mut(&mut self.state)
            .expect("configure before sharing")
            .pages
            .insert(url.to_string(), script);
        self
    }

    pub fn pages_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.navigations.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.session_closed.load(Ordering::SeqCst)
    }

    pub fn launcher(&self) -> MockLauncher {
        MockLauncher {
            session: Some(self.clone()),
        }
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn open_page(&self) -> Result<Box<dyn SessionPage>, BrowserError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            state: Arc::clone(&self.state),
            current: Mutex::new(None),
        }))
    }

    async fn close(&self) {
        self.state.session_closed.store(true, Ordering::SeqCst);
    }
}

struct MockPage {
    state: Arc<MockState>,
    current: Mutex<Option<String>>,
}

#[async_trait]
impl SessionPage for MockPage {
    async fn capture_response(
        &self,
        url: &str,
        url_marker: &str,
        deadline: Duration,
    ) -> Result<String, BrowserError> {
        self.state.navigations.lock().unwrap().push(url.to_string());
        if let Some(PageScript::NavigationFails) = self.state.pages.get(url) {
            let reason = format!("net::ERR_NAME_NOT_RESOLVED at {}", url);
            return Err(BrowserError::Navigation(reason));
        }
        let hit = self
            .state
            .captures
            .iter()
            .filter(|(part, _)| url.contains(part.as_str()))
            .flat_map(|(_, responses)| responses.iter())
            .find(|(response_url, _)| response_url.contains(url_marker))
            .map(|(_, body)| body.clone());

        match hit {
            Some(body) => Ok(body),
            None => {
                tokio::time::sleep(deadline).await;
                Err(BrowserError::Timeout(deadline))
            }
        }
    }

    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), BrowserError> {
        self.state.navigations.lock().unwrap().push(url.to_string());
        match self.state.pages.get(url) {
            Some(PageScript::NavigationFails) => {
                Err(BrowserError::Navigation(format!("net::ERR_FAILED at {}", url)))
            }
            Some(PageScript::NeverLoads) => {
                tokio::time::sleep(deadline).await;
                Err(BrowserError::Timeout(deadline))
            }
            _ => {
                *self.current.lock().unwrap() = Some(url.to_string());
                Ok(())
            }
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        let current = self.current.lock().unwrap().clone();
        match current.and_then(|url| self.state.pages.get(&url).cloned()) {
            Some(PageScript::Html(html)) => Ok(html),
            Some(PageScript::ContentFails) => {
                Err(BrowserError::Protocol("Execution context was destroyed".into()))
            }
            _ => Ok("<html><body></body></html>".to_string()),
        }
    }

    async fn close(&self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Launcher handing out a prepared session, or failing when it has none.
pub(crate) struct MockLauncher {
    session: Option<MockSession>,
}

impl MockLauncher {
    pub fn failing() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        match &self.session {
            Some(session) => Ok(Arc::new(session.clone())),
            None => Err(BrowserError::Launch("Chrome/Chromium not found".into())),
        }
    }
}
