//! Headless Chrome sessions via chromiumoxide.

use crate::config::{BrowserConfig as BrowserSettings, VerifierConfig};
use crate::error::{Error, Result};
use crate::verify::session::{PortalSession, SessionFactory};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launches a dedicated Chrome process for every session.
///
/// Nothing is shared between sessions: no cookies, no form state, no cache.
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    settings: BrowserSettings,
}

impl ChromeSessionFactory {
    /// Create a factory from the browser section of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured executable does not exist.
    pub fn new(config: &VerifierConfig) -> Result<Self> {
        if let Some(path) = &config.browser.executable {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "browser executable does not exist: {}",
                    path.display()
                )));
            }
        }

        info!(
            "Chrome session factory ready (headless={}, sandbox={})",
            config.browser.headless, config.browser.sandbox
        );

        Ok(Self {
            settings: config.browser.clone(),
        })
    }

    fn launch_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.settings.window_width, self.settings.window_height);
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if !self.settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.settings.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(Error::Browser)
    }
}

impl SessionFactory for ChromeSessionFactory {
    type Session = ChromeSession;

    async fn open(&self) -> Result<ChromeSession> {
        let (mut browser, mut handler) = Browser::launch(self.launch_config()?)
            .await
            .map_err(|e| Error::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after page error: {close_err}");
                }
                handler_task.abort();
                return Err(Error::Browser(format!("failed to open page: {e}")));
            }
        };

        debug!("Chrome session opened");
        Ok(ChromeSession {
            browser: Mutex::new(browser),
            page,
            handler_task,
        })
    }
}

/// A single Chrome process with one page.
pub struct ChromeSession {
    // Only touched by `close`; the mutex keeps the session `Sync`.
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    async fn find(&self, selector: &str) -> Result<Option<Element>> {
        lookup_outcome(selector, self.page.find_element(selector).await)
    }

    async fn find_required(&self, selector: &str) -> Result<Element> {
        self.find(selector)
            .await?
            .ok_or_else(|| Error::Browser(format!("element not found: {selector}")))
    }
}

/// Separate "nothing matches" from a browser that stopped answering.
///
/// Chrome reports an unmatched query as a protocol error on the node lookup;
/// anything else (socket, channel, timeout) means the session is unusable.
fn lookup_outcome<T>(
    selector: &str,
    found: std::result::Result<T, CdpError>,
) -> Result<Option<T>> {
    match found {
        Ok(element) => Ok(Some(element)),
        Err(CdpError::NotFound | CdpError::Chrome(_)) => Ok(None),
        Err(e) => Err(browser_err(&format!("query {selector}"), e)),
    }
}

fn browser_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Browser(format!("{context}: {e}"))
}

impl PortalSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| Error::Navigation(e.to_string()))
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.find(selector).await?.is_some())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.find_required(selector).await?;
        element.click().await.map_err(|e| browser_err("focus", e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| browser_err("type", e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.find_required(selector).await?;
        element.click().await.map_err(|e| browser_err("click", e))?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        match self.find(selector).await? {
            Some(element) => element
                .inner_text()
                .await
                .map_err(|e| browser_err("inner text", e)),
            None => Ok(None),
        }
    }

    async fn outer_html(&self, selector: &str) -> Result<Option<String>> {
        match self.find(selector).await? {
            Some(element) => element
                .outer_html()
                .await
                .map_err(|e| browser_err("outer html", e)),
            None => Ok(None),
        }
    }

    async fn close(self) -> Result<()> {
        let Self {
            browser,
            page: _,
            handler_task,
        } = self;
        let mut browser = browser.into_inner();

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| Error::SessionTeardown(e.to_string()));
        if closed.is_ok() {
            if let Err(e) = browser.wait().await {
                warn!("Browser process did not exit cleanly: {e}");
            }
        }
        handler_task.abort();
        closed
    }
}
