//! HTTP route modules for the relay.
//!
//! - `reports`: fault report submission (`POST /api/odoo-report`)
//! - `health`: liveness probe (`GET /health`)

pub mod health;
pub mod reports;
