//! Wire models shared by the relay endpoint and the form client.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Models
// ============================================================================

/// Body of `POST /api/odoo-report`.
///
/// Every field is optional on the wire so that a missing key or device id is
/// reported as an authorization or lookup failure rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

// ============================================================================
// Response Models
// ============================================================================

/// Error body returned for every locally rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Liveness probe body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub devices: usize,
}
