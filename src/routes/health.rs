//! Liveness probe.
//!
//! GET /health - Report that the relay is up and how many devices it knows

use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::models::HealthResponse;
use crate::relay::ReportRelay;

/// Build the health router.
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health(Extension(relay): Extension<ReportRelay>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        devices: relay.registry().len(),
    })
}
