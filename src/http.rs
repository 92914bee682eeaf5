//! Minimal HTTP surface over [`ProductVerifier::verify`].
//!
//! `GET /verify/{product_id}` answers 200 with the result as JSON, or 502
//! with a fixed message. Failure details stay in the logs.

use crate::error::{Error, Result};
use crate::verify::{ProductVerifier, SessionFactory};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Body returned when a product could not be verified.
pub const VERIFY_FAILED_MESSAGE: &str = "Product could not be verified";

/// Build the router.
pub fn router<F: SessionFactory>(verifier: ProductVerifier<F>) -> Router {
    Router::new()
        .route("/verify/{product_id}", get(verify_product::<F>))
        .route("/health", get(health))
        .with_state(verifier)
}

async fn verify_product<F: SessionFactory>(
    State(verifier): State<ProductVerifier<F>>,
    Path(product_id): Path<String>,
) -> Response {
    match verifier.verify(&product_id).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            warn!("Verify request for {product_id} failed: {e}");
            (StatusCode::BAD_GATEWAY, VERIFY_FAILED_MESSAGE).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Serve the router on `listen` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve<F: SessionFactory>(verifier: ProductVerifier<F>, listen: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| Error::Server(format!("failed to bind {listen}: {e}")))?;
    info!("Listening on {}", listen);

    axum::serve(listener, router(verifier))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {e}");
            }
            info!("Ctrl-C received, shutting down");
        })
        .await
        .map_err(|e| Error::Server(e.to_string()))
}
