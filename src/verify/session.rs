//! Browser session abstraction used by the portal driver.
//!
//! A [`SessionFactory`] opens one isolated session per verification job; the
//! driver talks to it only through [`PortalSession`]. The production
//! implementation is [`crate::verify::ChromeSessionFactory`].

use crate::error::Result;
use std::future::Future;
use tracing::{debug, warn};

/// One isolated browser session against the portal.
///
/// Lookups that find nothing report it through their return value rather
/// than an error; errors mean the session itself misbehaved.
pub trait PortalSession: Send + Sync + 'static {
    /// Load `url` and wait for the document to finish loading.
    fn navigate(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether an element matching `selector` is currently present.
    fn exists(&self, selector: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Focus the element matching `selector` and type `text` into it.
    fn type_text(&self, selector: &str, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Click the element matching `selector`.
    fn click(&self, selector: &str) -> impl Future<Output = Result<()>> + Send;

    /// Rendered text of the first element matching `selector`.
    fn inner_text(&self, selector: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Outer HTML of the first element matching `selector`.
    fn outer_html(&self, selector: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Tear the session down.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// Opens fresh portal sessions.
pub trait SessionFactory: Send + Sync + 'static {
    /// Session type produced by this factory.
    type Session: PortalSession;

    /// Open a new, isolated session.
    fn open(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Owns a session for the duration of one job and guarantees it is closed.
///
/// [`SessionGuard::close`] is the normal release point. If the guard is
/// dropped while still holding its session (the job future was cancelled),
/// the close is spawned onto the runtime captured at construction.
pub struct SessionGuard<S: PortalSession> {
    session: Option<S>,
    label: String,
    runtime: Option<tokio::runtime::Handle>,
}

impl<S: PortalSession> SessionGuard<S> {
    /// Wrap a freshly opened session.
    pub fn new(session: S, label: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            label: label.into(),
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    /// The wrapped session, while it is still open.
    #[must_use]
    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    /// Close the session. Failures are logged and swallowed.
    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => debug!("Session closed for {}", self.label),
                Err(e) => warn!("Session teardown failed for {}: {}", self.label, e),
            }
        }
    }
}

impl<S: PortalSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let label = std::mem::take(&mut self.label);
        match &self.runtime {
            Some(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!("Deferred session teardown failed for {}: {}", label, e);
                    }
                });
            }
            None => warn!("Session for {} dropped outside a runtime; not closed", label),
        }
    }
}
