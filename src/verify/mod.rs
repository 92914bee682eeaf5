//! Product-authenticity verification.
//!
//! The external portal is a plain HTML form with no API behind it, so every
//! lookup drives a real browser session. Lookups are expensive and the portal
//! is not built for parallel bot traffic, hence the layout below.
//!
//! # Architecture
//!
//! ```text
//! verify(product_id)
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ Check result cache  │
//! └─────────┬───────────┘
//!           │
//!    ┌──────┴──────┐
//!    │             │
//!   HIT          MISS
//!    │             │
//!    ▼             ▼
//!  Return     Enqueue (FIFO, single drain)
//!                  │
//!                  ▼
//!           Open fresh session ──► load portal ──► submit identifier
//!                                                        │
//!                                          ┌─────────────┴─────────────┐
//!                                          │ race: table vs rejection  │
//!                                          └─────────────┬─────────────┘
//!                                                        │
//!                      ┌──────────────┬──────────────────┼──────────────┐
//!                      │              │                  │              │
//!                   Invalid     ValidWithData       ValidNoData      Timeout
//!                      │              │                  │              │
//!                      └──────────────┴───────┬──────────┘              ▼
//!                                             ▼                 ScrapeFailure
//!                                     Cache + return           (not cached)
//! ```

mod cache;
mod chrome;
pub mod classifier;
mod driver;
pub mod monitor;
pub mod normalizer;
pub mod queue;
pub mod session;
mod types;
mod verifier;

pub use cache::{CacheStats, ResultCache};
pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use classifier::{Classification, Observation};
pub use driver::PortalDriver;
pub use monitor::{DriftAlert, DriftMonitor};
pub use normalizer::{normalize, NormalizedAttributes};
pub use queue::{DrainState, JobQueue};
pub use session::{PortalSession, SessionFactory, SessionGuard};
pub use types::VerificationResult;
pub use verifier::{ProductVerifier, VerifierStats};
