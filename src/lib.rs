//! # Device Fault Relay
//!
//! Receives fault reports submitted from a QR-code form and files them as
//! maintenance requests in Odoo over JSON-RPC. The library exposes the Axum
//! router so integration tests can run the relay in-process, and the form
//! client logic so it can be exercised without a browser.

pub mod category;
pub mod config;
pub mod erp;
pub mod error;
pub mod form;
pub mod models;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod ticket;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::relay::ReportRelay;

/// Build the Axum router with all route modules and middleware.
///
/// This function does NOT bind a listener; the caller serves the router.
pub fn create_app(relay: ReportRelay) -> Router {
    Router::new()
        .merge(routes::reports::router())
        .merge(routes::health::router())
        .layer(Extension(relay))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
