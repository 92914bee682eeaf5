//! Verification facade combining result cache, job queue and portal driver.
//!
//! This is the only entry point the rest of the application uses.

use crate::config::VerifierConfig;
use crate::error::{Error, Result};
use crate::event::{create_event_channel, VerifierEvent, VerifierEventsChannel, VerifierEventsSender};
use crate::verify::cache::{CacheStats, ResultCache};
use crate::verify::driver::PortalDriver;
use crate::verify::monitor::DriftMonitor;
use crate::verify::queue::{DrainState, JobQueue};
use crate::verify::session::SessionFactory;
use crate::verify::types::VerificationResult;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Counters over every job the verifier has run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifierStats {
    /// Jobs that reached the driver.
    pub jobs: u64,
    /// Genuine products with attribute data.
    pub valid_with_data: u64,
    /// Genuine products without attribute data.
    pub valid_no_data: u64,
    /// Products the portal rejected.
    pub invalid: u64,
    /// Jobs that failed for any reason, timeouts included.
    pub failures: u64,
    /// Jobs where no result marker appeared in time.
    pub timeouts: u64,
}

/// A pending lookup waiting for its job to run.
struct VerificationRequest {
    product_id: String,
    reply: oneshot::Sender<Result<VerificationResult>>,
}

struct Inner<F: SessionFactory> {
    cache: ResultCache,
    queue: Mutex<JobQueue<VerificationRequest>>,
    driver: PortalDriver<F>,
    monitor: Mutex<DriftMonitor>,
    stats: Mutex<VerifierStats>,
    events: VerifierEventsSender,
}

/// Verifies product identifiers against the external portal.
///
/// Cheap to clone; clones share cache, queue and session factory. At most
/// one portal session is open at any time regardless of how many callers
/// are waiting.
pub struct ProductVerifier<F: SessionFactory> {
    inner: Arc<Inner<F>>,
}

impl<F: SessionFactory> Clone for ProductVerifier<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: SessionFactory> ProductVerifier<F> {
    /// Create a verifier with an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the portal URL in `config` is missing or invalid.
    pub fn new(factory: F, config: &VerifierConfig) -> Result<Self> {
        let portal_url = config.portal_url()?;
        let (events, _) = create_event_channel();

        info!(
            "Product verifier initialized (portal={}, classification_timeout={:?})",
            portal_url,
            config.timeouts.classification()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                cache: ResultCache::new(),
                queue: Mutex::new(JobQueue::new()),
                driver: PortalDriver::new(factory, portal_url, config.timeouts.clone()),
                monitor: Mutex::new(DriftMonitor::new(&config.monitor)),
                stats: Mutex::new(VerifierStats::default()),
                events,
            }),
        })
    }

    /// Verify a product identifier.
    ///
    /// A cached result is returned immediately. Otherwise the lookup is
    /// queued behind any jobs already waiting and this call resolves when
    /// its own job finishes. The identifier is passed to the portal as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScrapeFailure`] if the job did not reach a terminal
    /// classification. Nothing is cached in that case, so calling again
    /// retries from scratch.
    pub async fn verify(&self, product_id: &str) -> Result<VerificationResult> {
        if let Some(hit) = self.inner.cache.get(product_id) {
            debug!("Product {product_id} found in result cache");
            self.inner.emit(VerifierEvent::CacheHit {
                product_id: product_id.to_string(),
            });
            return Ok(hit);
        }

        let (reply, response) = oneshot::channel();
        let request = VerificationRequest {
            product_id: product_id.to_string(),
            reply,
        };

        let (start_drain, depth) = {
            let mut queue = self.inner.queue.lock();
            let start = queue.push(request);
            (start, queue.len())
        };
        debug!("Product {product_id} queued (depth={depth})");
        self.inner.emit(VerifierEvent::JobQueued {
            product_id: product_id.to_string(),
            depth,
        });

        if start_drain {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.drain());
        }

        response.await.unwrap_or(Err(Error::ScrapeFailure))
    }

    /// Subscribe to verifier events.
    #[must_use]
    pub fn subscribe_events(&self) -> VerifierEventsChannel {
        self.inner.events.subscribe()
    }

    /// Get cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Get the number of cached results.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Whether a result for `product_id` is cached.
    #[must_use]
    pub fn is_cached(&self, product_id: &str) -> bool {
        self.inner.cache.contains(product_id)
    }

    /// Get job statistics.
    #[must_use]
    pub fn stats(&self) -> VerifierStats {
        self.inner.stats.lock().clone()
    }

    /// Lookups waiting for a session.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Whether a drain is currently running.
    #[must_use]
    pub fn drain_state(&self) -> DrainState {
        self.inner.queue.lock().state()
    }

    /// The session factory jobs are run with.
    #[must_use]
    pub fn factory(&self) -> &F {
        self.inner.driver.factory()
    }
}

impl<F: SessionFactory> Inner<F> {
    /// Run queued jobs one after another until the queue is empty.
    async fn drain(self: Arc<Self>) {
        debug!("Drain started");
        let _reset = DrainReset { inner: &self };
        loop {
            let next = self.queue.lock().next();
            let Some(request) = next else {
                break;
            };

            let outcome = self.run_job(&request.product_id).await;
            if request.reply.send(outcome).is_err() {
                debug!("Caller for {} went away before its result", request.product_id);
            }
        }
        debug!("Drain finished, queue idle");
    }

    async fn run_job(&self, product_id: &str) -> Result<VerificationResult> {
        self.emit(VerifierEvent::JobStarted {
            product_id: product_id.to_string(),
        });

        match self.driver.run(product_id).await {
            Ok(result) => {
                info!(
                    "Product {} verified (invalid={}, attributes={})",
                    product_id,
                    result.invalid,
                    result.attributes.len()
                );
                self.record_success(&result);
                self.cache.insert(result.clone());
                self.emit(VerifierEvent::JobCompleted {
                    product_id: product_id.to_string(),
                    invalid: result.invalid,
                });
                Ok(result)
            }
            Err(e) => {
                warn!("Verification of {} failed: {}", product_id, e);
                let timeout = e.is_timeout();
                self.record_failure(timeout);
                self.emit(VerifierEvent::JobFailed {
                    product_id: product_id.to_string(),
                    timeout,
                });
                Err(Error::ScrapeFailure)
            }
        }
    }

    fn record_success(&self, result: &VerificationResult) {
        {
            let mut stats = self.stats.lock();
            stats.jobs += 1;
            if result.invalid {
                stats.invalid += 1;
            } else if result.has_data() {
                stats.valid_with_data += 1;
            } else {
                stats.valid_no_data += 1;
            }
        }
        self.observe_drift(false);
    }

    fn record_failure(&self, timeout: bool) {
        {
            let mut stats = self.stats.lock();
            stats.jobs += 1;
            stats.failures += 1;
            if timeout {
                stats.timeouts += 1;
            }
        }
        self.observe_drift(timeout);
    }

    fn observe_drift(&self, timed_out: bool) {
        let alert = self.monitor.lock().record(timed_out);
        if let Some(alert) = alert {
            warn!(
                "{} of the last {} verification jobs timed out; portal markup may have changed",
                alert.timeouts, alert.window
            );
            self.emit(VerifierEvent::DriftSuspected {
                timeouts: alert.timeouts,
                window: alert.window,
            });
        }
    }

    fn emit(&self, event: VerifierEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Fails the remaining queue and returns it to `Idle` if a job panics, so
/// later lookups start a fresh drain instead of waiting forever.
struct DrainReset<'a, F: SessionFactory> {
    inner: &'a Inner<F>,
}

impl<F: SessionFactory> Drop for DrainReset<'_, F> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        warn!("Verification job panicked, failing queued lookups");
        loop {
            let next = self.inner.queue.lock().next();
            let Some(request) = next else {
                break;
            };
            let _ = request.reply.send(Err(Error::ScrapeFailure));
        }
    }
}
