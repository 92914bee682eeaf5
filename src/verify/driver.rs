//! Runs one verification job against the portal.
//!
//! Steps, strictly in order: open a fresh session, load the entry page,
//! wait for the identifier field, type and submit, race the results table
//! against the rejection heading, classify, and close the session. The
//! session is closed exactly once on every path out of [`PortalDriver::run`].

use crate::config::TimeoutConfig;
use crate::error::{Error, Result};
use crate::verify::classifier::{
    self, Classification, Observation, IDENTIFIER_INPUT, REJECTION_HEADING, RESULTS_TABLE,
    SUBMIT_CONTROL,
};
use crate::verify::session::{PortalSession, SessionFactory, SessionGuard};
use crate::verify::types::VerificationResult;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

/// Drives the portal through sessions from `F`.
pub struct PortalDriver<F: SessionFactory> {
    factory: F,
    portal_url: Url,
    timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Table,
    Heading,
}

impl<F: SessionFactory> PortalDriver<F> {
    /// Create a driver for the portal at `portal_url`.
    pub fn new(factory: F, portal_url: Url, timeouts: TimeoutConfig) -> Self {
        Self {
            factory,
            portal_url,
            timeouts,
        }
    }

    /// The portal entry page.
    #[must_use]
    pub fn portal_url(&self) -> &Url {
        &self.portal_url
    }

    /// The session factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Verify `product_id` in a fresh session.
    ///
    /// # Errors
    ///
    /// - [`Error::Navigation`] if the entry page does not load in time
    /// - [`Error::ClassificationTimeout`] if no result marker appears in time
    /// - any other session or extraction error raised along the way
    ///
    /// Teardown failures are logged and never returned.
    pub async fn run(&self, product_id: &str) -> Result<VerificationResult> {
        let session = self.factory.open().await?;
        let guard = SessionGuard::new(session, product_id);

        let outcome = match guard.session() {
            Some(session) => self.run_steps(session, product_id).await,
            None => Err(Error::Browser("session released early".to_string())),
        };

        guard.close().await;
        outcome
    }

    async fn run_steps(&self, session: &F::Session, product_id: &str) -> Result<VerificationResult> {
        let navigation = self.timeouts.navigation();
        match timeout(navigation, session.navigate(self.portal_url.as_str())).await {
            Ok(Ok(())) => {}
            Ok(Err(e @ Error::Navigation(_))) => return Err(e),
            Ok(Err(e)) => return Err(Error::Navigation(e.to_string())),
            Err(_) => {
                return Err(Error::Navigation(format!(
                    "entry page did not load within {navigation:?}"
                )))
            }
        }
        debug!("{product_id}: entry page loaded");

        let element = self.timeouts.element();
        timeout(element, self.wait_for(session, IDENTIFIER_INPUT))
            .await
            .map_err(|_| {
                Error::Browser(format!("identifier field did not appear within {element:?}"))
            })??;

        session.type_text(IDENTIFIER_INPUT, product_id).await?;
        session.click(SUBMIT_CONTROL).await?;
        debug!("{product_id}: lookup submitted");

        let observation = self.observe(session).await?;
        match classifier::classify(&observation, Some(&self.portal_url))? {
            Classification::Timeout => Err(Error::ClassificationTimeout(
                self.timeouts.classification(),
            )),
            terminal => VerificationResult::from_classification(product_id, terminal)
                .ok_or_else(|| Error::Extraction("non-terminal classification".to_string())),
        }
    }

    /// Race the two result markers and collect what the page shows.
    async fn observe(&self, session: &F::Session) -> Result<Observation> {
        let race = async {
            tokio::select! {
                found = self.wait_for(session, RESULTS_TABLE) => found.map(|()| Marker::Table),
                found = self.wait_for(session, REJECTION_HEADING) => found.map(|()| Marker::Heading),
            }
        };

        let marker = match timeout(self.timeouts.classification(), race).await {
            Ok(marker) => marker?,
            Err(_) => return Ok(Observation::TimedOut),
        };
        debug!("Result marker appeared: {marker:?}");

        let heading = match marker {
            Marker::Heading => session.inner_text(REJECTION_HEADING).await?,
            Marker::Table => None,
        };
        if heading.as_deref().is_some_and(classifier::is_rejection) {
            return Ok(Observation::Rendered {
                heading,
                table_html: None,
            });
        }

        let table_html = session.outer_html(RESULTS_TABLE).await?;
        Ok(Observation::Rendered {
            heading,
            table_html,
        })
    }

    /// Poll until `selector` matches. Callers bound this with a timeout.
    async fn wait_for(&self, session: &F::Session, selector: &str) -> Result<()> {
        let interval = self.poll_interval();
        loop {
            if session.exists(selector).await? {
                return Ok(());
            }
            tokio::time::sleep(interval).await;
        }
    }

    fn poll_interval(&self) -> Duration {
        self.timeouts.poll_interval()
    }
}
