//! End-to-end tests for gi-verify.
//!
//! These drive the public [`gi_verify::ProductVerifier`] through a scripted
//! portal, exercising queue, driver, classifier, normalizer and cache
//! together.

mod harness;
mod verification_tests;

pub use harness::{test_config, verifier, FakePortal, PortalPage};
