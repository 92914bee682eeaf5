//! # gi-verify
//!
//! Product-authenticity verification engine for the GI crafts registry.
//!
//! The registry's authenticity lookup is backed by an external portal that
//! only offers an HTML form. This crate drives that portal through a headless
//! browser, one session at a time, classifies what the portal renders and
//! caches the outcome for the lifetime of the process.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use gi_verify::{ChromeSessionFactory, ProductVerifier, VerifierConfig};
//!
//! let config = VerifierConfig::default();
//! let factory = ChromeSessionFactory::new(&config)?;
//! let verifier = ProductVerifier::new(factory, &config)?;
//!
//! let result = verifier.verify("GI-0001-2345").await?;
//! if result.invalid {
//!     println!("counterfeit or unregistered");
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod http;
pub mod verify;

pub use config::VerifierConfig;
pub use error::{Error, Result};
pub use event::{VerifierEvent, VerifierEventsChannel};
pub use verify::{
    ChromeSessionFactory, Classification, ProductVerifier, VerificationResult, VerifierStats,
};
