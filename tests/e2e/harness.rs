//! Scripted portal used by the E2E tests.
//!
//! `FakePortal` is a [`SessionFactory`] whose sessions behave like the real
//! verification portal for a fixed set of identifiers. Every session records
//! when it was opened and closed so tests can assert on session counts and
//! on overlap between sessions.

#![allow(clippy::expect_used)]

use gi_verify::verify::classifier::{
    IDENTIFIER_INPUT, REJECTION_HEADING, REJECTION_PHRASE, RESULTS_TABLE,
};
use gi_verify::verify::{PortalSession, SessionFactory};
use gi_verify::{Error, ProductVerifier, Result, VerifierConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Portal URL used by every test configuration.
pub const PORTAL_URL: &str = "https://portal.test/";

/// How the portal answers a given identifier.
#[derive(Debug, Clone)]
pub enum PortalPage {
    /// Results table with these `(label, value)` rows and optional image.
    Genuine {
        /// Table rows.
        rows: Vec<(String, String)>,
        /// Image `src`, as written in the markup.
        image: Option<String>,
    },
    /// Rejection heading.
    Rejected,
    /// A table with no usable rows.
    EmptyTable {
        /// Image `src`, as written in the markup.
        image: Option<String>,
    },
    /// Nothing ever appears after submit.
    Silent,
    /// The table vanishes while it is being read.
    BrokenTable,
}

impl PortalPage {
    /// Convenience constructor for a genuine product.
    pub fn genuine(rows: &[(&str, &str)]) -> Self {
        Self::Genuine {
            rows: rows
                .iter()
                .map(|(l, v)| ((*l).to_string(), (*v).to_string()))
                .collect(),
            image: None,
        }
    }

    fn table_html(&self) -> Option<String> {
        let (rows, image) = match self {
            Self::Genuine { rows, image } => (rows.as_slice(), image.as_deref()),
            Self::EmptyTable { image } => (&[][..], image.as_deref()),
            Self::BrokenTable => (&[][..], None),
            _ => return None,
        };

        let mut html = String::from("<table>");
        if let Some(src) = image {
            html.push_str(&format!(r#"<tr><td colspan="2"><img src="{src}"></td></tr>"#));
        }
        for (label, value) in rows {
            html.push_str(&format!("<tr><td>{label}</td><td>{value}</td></tr>"));
        }
        html.push_str("</table>");
        Some(html)
    }
}

/// One session's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct SessionSpan {
    /// When the session was opened.
    pub opened: Instant,
    /// When it was closed, if it has been.
    pub closed: Option<Instant>,
}

#[derive(Default)]
struct Log {
    spans: Vec<SessionSpan>,
    submitted: Vec<String>,
    active: usize,
    max_active: usize,
}

/// Scripted [`SessionFactory`].
#[derive(Clone)]
pub struct FakePortal {
    pages: Arc<HashMap<String, PortalPage>>,
    latency: Duration,
    offline: bool,
    log: Arc<Mutex<Log>>,
}

impl FakePortal {
    /// Portal answering `pages`; unknown identifiers get the rejection page.
    pub fn new(pages: impl IntoIterator<Item = (&'static str, PortalPage)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(id, page)| (id.to_string(), page))
                    .collect(),
            ),
            latency: Duration::from_millis(5),
            offline: false,
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    /// Delay added to navigation, widening any overlap between sessions.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the entry page fail to load.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.log.lock().spans.len()
    }

    /// Sessions closed so far.
    pub fn sessions_closed(&self) -> usize {
        self.log.lock().spans.iter().filter(|s| s.closed.is_some()).count()
    }

    /// Highest number of sessions open at the same time.
    pub fn max_concurrent_sessions(&self) -> usize {
        self.log.lock().max_active
    }

    /// Every session span, in opening order.
    pub fn spans(&self) -> Vec<SessionSpan> {
        self.log.lock().spans.clone()
    }

    /// Identifiers typed into the portal, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.log.lock().submitted.clone()
    }
}

impl SessionFactory for FakePortal {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession> {
        let mut log = self.log.lock();
        log.spans.push(SessionSpan {
            opened: Instant::now(),
            closed: None,
        });
        log.active += 1;
        log.max_active = log.max_active.max(log.active);
        let index = log.spans.len() - 1;
        drop(log);

        Ok(FakeSession {
            portal: self.clone(),
            index,
            typed: Mutex::new(None),
            submitted: Mutex::new(false),
        })
    }
}

/// Session produced by [`FakePortal`].
pub struct FakeSession {
    portal: FakePortal,
    index: usize,
    typed: Mutex<Option<String>>,
    submitted: Mutex<bool>,
}

impl FakeSession {
    fn page(&self) -> Option<PortalPage> {
        if !*self.submitted.lock() {
            return None;
        }
        let typed = self.typed.lock().clone()?;
        Some(
            self.portal
                .pages
                .get(&typed)
                .cloned()
                .unwrap_or(PortalPage::Rejected),
        )
    }
}

impl PortalSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        tokio::time::sleep(self.portal.latency).await;
        if self.portal.offline {
            return Err(Error::Browser("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        if url != PORTAL_URL {
            return Err(Error::Browser(format!("unexpected url {url}")));
        }
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let Some(page) = self.page() else {
            return Ok(selector == IDENTIFIER_INPUT);
        };
        Ok(match page {
            PortalPage::Rejected => selector == REJECTION_HEADING,
            PortalPage::Genuine { .. } | PortalPage::EmptyTable { .. } | PortalPage::BrokenTable => {
                selector == RESULTS_TABLE
            }
            PortalPage::Silent => false,
        })
    }

    async fn type_text(&self, _selector: &str, text: &str) -> Result<()> {
        *self.typed.lock() = Some(text.to_string());
        self.portal.log.lock().submitted.push(text.to_string());
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<()> {
        *self.submitted.lock() = true;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        Ok(match self.page() {
            Some(PortalPage::Rejected) if selector == REJECTION_HEADING => {
                Some(format!("  {REJECTION_PHRASE}  "))
            }
            _ => None,
        })
    }

    async fn outer_html(&self, _selector: &str) -> Result<Option<String>> {
        match self.page() {
            Some(PortalPage::BrokenTable) => Err(Error::Browser("node is detached".to_string())),
            Some(page) => Ok(page.table_html()),
            None => Ok(None),
        }
    }

    async fn close(self) -> Result<()> {
        let mut log = self.portal.log.lock();
        if let Some(span) = log.spans.get_mut(self.index) {
            span.closed = Some(Instant::now());
        }
        log.active -= 1;
        Ok(())
    }
}

/// Configuration pointing at [`PORTAL_URL`] with short timeouts.
pub fn test_config() -> VerifierConfig {
    let mut config = VerifierConfig::default();
    config.portal.url = PORTAL_URL.to_string();
    config.timeouts.navigation_secs = 2;
    config.timeouts.element_secs = 1;
    config.timeouts.classification_secs = 1;
    config.timeouts.poll_interval_ms = 5;
    config.monitor.window = 2;
    config
}

/// Verifier over `portal` using [`test_config`].
pub fn verifier<F: SessionFactory>(portal: F) -> ProductVerifier<F> {
    ProductVerifier::new(portal, &test_config()).expect("test config is valid")
}
