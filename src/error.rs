//! Error types for gi-verify.

use thiserror::Error;

/// Result type alias using the crate error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the verification engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The portal entry page did not load within its timeout.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Neither the results table nor the rejection heading appeared in time.
    #[error("no result marker appeared within {0:?}")]
    ClassificationTimeout(std::time::Duration),

    /// Closing the browser session failed.
    #[error("session teardown failed: {0}")]
    SessionTeardown(String),

    /// Any other browser or session fault during a job.
    #[error("browser error: {0}")]
    Browser(String),

    /// The rendered page could not be interpreted.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Stable, caller-facing failure for any job that did not reach a
    /// terminal classification.
    #[error("product could not be verified")]
    ScrapeFailure,

    /// The HTTP listener failed.
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Whether this error means the portal showed no result marker in time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ClassificationTimeout(_))
    }
}
