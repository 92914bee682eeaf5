//! Verification behaviour through the public facade.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{test_config, verifier, FakePortal, PortalPage};
use futures::future::join_all;
use gi_verify::verify::DrainState;
use gi_verify::{ChromeSessionFactory, Error, ProductVerifier, VerifierEvent};
use std::time::Duration;

fn catalogue() -> FakePortal {
    FakePortal::new([
        (
            "GI-100",
            PortalPage::genuine(&[
                ("Authorized GI User", "Acme"),
                ("Artisan Name", "Jane"),
                ("Color", "Red"),
            ]),
        ),
        ("FAKE-1", PortalPage::Rejected),
        (
            "GI-EMPTY",
            PortalPage::EmptyTable {
                image: Some("/media/empty.jpg".to_string()),
            },
        ),
        ("GI-SILENT", PortalPage::Silent),
        ("GI-BROKEN", PortalPage::BrokenTable),
    ])
}

/// A second lookup for the same product is served from cache.
#[tokio::test]
async fn test_cache_idempotence() {
    let verifier = verifier(catalogue());

    let first = verifier.verify("GI-100").await.expect("first lookup");
    let second = verifier.verify("GI-100").await.expect("second lookup");

    assert_eq!(first, second);
    assert_eq!(verifier.factory().sessions_opened(), 1);
    assert_eq!(verifier.cache_stats().hits, 1);
}

/// Concurrent lookups for distinct products run one session at a time, in
/// arrival order.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sessions_never_overlap() {
    let ids: Vec<String> = (0..6).map(|i| format!("GI-{i}")).collect();
    let portal = FakePortal::new([]).with_latency(Duration::from_millis(20));
    let verifier = verifier(portal);

    let results = join_all(ids.iter().map(|id| verifier.verify(id))).await;
    assert!(results.iter().all(Result::is_ok));

    let portal = verifier.factory();
    assert_eq!(portal.sessions_opened(), ids.len());
    assert_eq!(portal.max_concurrent_sessions(), 1);
    assert_eq!(portal.submitted(), ids);

    let spans = portal.spans();
    for pair in spans.windows(2) {
        let closed = pair[0].closed.expect("session closed");
        assert!(closed <= pair[1].opened, "sessions overlapped: {pair:?}");
    }
}

/// Duplicate in-flight lookups are not coalesced.
#[tokio::test]
async fn test_duplicate_requests_each_run() {
    let verifier = verifier(catalogue());

    let (a, b) = tokio::join!(verifier.verify("GI-100"), verifier.verify("GI-100"));

    assert_eq!(a.expect("first"), b.expect("second"));
    assert_eq!(verifier.factory().sessions_opened(), 2);
    assert_eq!(verifier.cache_len(), 1);
}

/// A rejected product carries no attribute data.
#[tokio::test]
async fn test_invalid_product_contract() {
    let verifier = verifier(catalogue());

    for id in ["FAKE-1", "UNKNOWN-7"] {
        let result = verifier.verify(id).await.expect("classified");
        assert!(result.invalid, "{id}");
        assert!(result.attributes.is_empty(), "{id}");
        assert!(result.authorized_distributor.is_none(), "{id}");
        assert!(result.artisan.is_none(), "{id}");
    }
    assert_eq!(verifier.stats().invalid, 2);
}

/// An empty table is a genuine product without data, not a rejection.
#[tokio::test]
async fn test_empty_table_is_not_invalid() {
    let verifier = verifier(catalogue());

    let result = verifier.verify("GI-EMPTY").await.expect("classified");

    assert!(!result.invalid);
    assert!(result.attributes.is_empty());
    assert_eq!(
        result.image_url.as_deref(),
        Some("https://portal.test/media/empty.jpg")
    );
    assert!(verifier.is_cached("GI-EMPTY"));
    assert_eq!(verifier.stats().valid_no_data, 1);
}

/// Promoted fields are lifted out of the attribute map.
#[tokio::test]
async fn test_promotion_precedence() {
    let verifier = verifier(catalogue());

    let result = verifier.verify("GI-100").await.expect("verified");

    assert!(!result.invalid);
    assert_eq!(result.authorized_distributor.as_deref(), Some("Acme"));
    assert_eq!(result.artisan.as_deref(), Some("Jane"));
    assert_eq!(result.attributes.len(), 1);
    assert_eq!(result.attributes["Color"], "Red");
}

/// When several rows match the artisan heuristic, the later one wins.
#[tokio::test]
async fn test_last_artisan_row_wins() {
    let portal = FakePortal::new([(
        "GI-200",
        PortalPage::genuine(&[("Artisan", "Jane"), ("Weaver Name", "Ravi")]),
    )]);
    let verifier = verifier(portal);

    let result = verifier.verify("GI-200").await.expect("verified");

    assert_eq!(result.artisan.as_deref(), Some("Ravi"));
}

/// A timed-out lookup is not cached and the next call opens a new session.
#[tokio::test]
async fn test_failure_is_not_cached() {
    let verifier = verifier(catalogue());

    let err = verifier.verify("GI-SILENT").await.expect_err("timeout");
    assert!(matches!(err, Error::ScrapeFailure));
    assert!(!verifier.is_cached("GI-SILENT"));

    let _ = verifier.verify("GI-SILENT").await;
    assert_eq!(verifier.factory().sessions_opened(), 2);

    let stats = verifier.stats();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.timeouts, 2);
}

/// Every job closes its session exactly once, whichever step fails.
#[tokio::test]
async fn test_teardown_on_every_path() {
    let verifier = verifier(catalogue());
    for id in ["GI-100", "FAKE-1", "GI-EMPTY", "GI-SILENT", "GI-BROKEN"] {
        let _ = verifier.verify(id).await;
    }
    let portal = verifier.factory();
    assert_eq!(portal.sessions_opened(), 5);
    assert_eq!(portal.sessions_closed(), 5);

    let offline = verifier_offline();
    assert!(offline.verify("GI-100").await.is_err());
    assert_eq!(offline.factory().sessions_opened(), 1);
    assert_eq!(offline.factory().sessions_closed(), 1);
}

fn verifier_offline() -> ProductVerifier<FakePortal> {
    verifier(catalogue().offline())
}

/// Repeated timeouts raise a drift alert.
#[tokio::test]
async fn test_timeouts_raise_drift_alert() {
    let verifier = verifier(catalogue());
    let mut events = verifier.subscribe_events();

    let _ = verifier.verify("GI-SILENT").await;
    let _ = verifier.verify("GI-SILENT").await;

    let mut drift = None;
    while let Ok(event) = events.try_recv() {
        if let VerifierEvent::DriftSuspected { timeouts, window } = event {
            drift = Some((timeouts, window));
        }
    }
    assert_eq!(drift, Some((2, test_config().monitor.window)));
}

/// The queue goes idle once every caller has its answer.
#[tokio::test]
async fn test_queue_drains_to_idle() {
    let verifier = verifier(catalogue());

    let _ = join_all(["GI-100", "FAKE-1", "GI-EMPTY"].map(|id| verifier.verify(id))).await;
    tokio::task::yield_now().await;

    assert_eq!(verifier.queue_depth(), 0);
    assert_eq!(verifier.drain_state(), DrainState::Idle);
}

/// Live check against a real portal and Chrome.
#[tokio::test]
#[ignore = "Requires Chrome and GI_VERIFY_PORTAL_URL / GI_VERIFY_PRODUCT_ID - run with --ignored"]
async fn test_live_portal() {
    let mut config = test_config();
    config.portal.url = std::env::var("GI_VERIFY_PORTAL_URL").expect("GI_VERIFY_PORTAL_URL");
    config.timeouts.navigation_secs = 30;
    config.timeouts.element_secs = 10;
    config.timeouts.classification_secs = 15;
    config.timeouts.poll_interval_ms = 250;
    let product_id = std::env::var("GI_VERIFY_PRODUCT_ID").expect("GI_VERIFY_PRODUCT_ID");

    let factory = ChromeSessionFactory::new(&config).expect("factory");
    let verifier = ProductVerifier::new(factory, &config).expect("verifier");

    let result = verifier.verify(&product_id).await.expect("verified");
    assert_eq!(result.product_id, product_id);
    if result.invalid {
        assert!(!result.has_data());
    }
}
