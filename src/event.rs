//! Verifier event system.

use tokio::sync::broadcast;

/// Events emitted by the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierEvent {
    /// A lookup was answered from the result cache.
    CacheHit {
        /// Product identifier.
        product_id: String,
    },

    /// A lookup missed the cache and was queued.
    JobQueued {
        /// Product identifier.
        product_id: String,
        /// Entries waiting after this one was appended.
        depth: usize,
    },

    /// A job opened its browser session.
    JobStarted {
        /// Product identifier.
        product_id: String,
    },

    /// A job reached a terminal classification.
    JobCompleted {
        /// Product identifier.
        product_id: String,
        /// Whether the portal flagged the product as not genuine.
        invalid: bool,
    },

    /// A job failed and was not cached.
    JobFailed {
        /// Product identifier.
        product_id: String,
        /// Whether the failure was a classification timeout.
        timeout: bool,
    },

    /// Timeouts dominate recent jobs; the portal markup may have changed.
    DriftSuspected {
        /// Timed-out jobs in the window.
        timeouts: usize,
        /// Window size.
        window: usize,
    },
}

/// Channel for receiving verifier events.
pub type VerifierEventsChannel = broadcast::Receiver<VerifierEvent>;

/// Sender for verifier events.
pub type VerifierEventsSender = broadcast::Sender<VerifierEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (VerifierEventsSender, VerifierEventsChannel) {
    broadcast::channel(256)
}
