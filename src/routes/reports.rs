//! Fault report routes.
//!
//! POST /api/odoo-report - Validate a report and file it as an ERP maintenance request

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Extension, Json, Router};
use tracing::warn;

use crate::erp::ErpResponse;
use crate::error::RelayError;
use crate::models::ReportRequest;
use crate::relay::ReportRelay;

/// Build the reports router.
pub fn router() -> Router {
    Router::new().route("/api/odoo-report", post(submit_report))
}

/// Relay a fault report to the ERP.
///
/// Local rejections answer with `{"error": ...}`. Once the report is accepted
/// the ERP's reply body is returned byte for byte: `200` when the ERP answered
/// with a success status, the ERP's own status otherwise.
async fn submit_report(
    Extension(relay): Extension<ReportRelay>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(report) = payload.map_err(|rejection| {
        warn!("Rejected undecodable report body: {}", rejection.body_text());
        RelayError::MalformedRequest(rejection.body_text())
    })?;

    let erp_response = relay.submit_report(report).await?;
    Ok(forward(erp_response))
}

fn forward(erp_response: ErpResponse) -> Response {
    let status = if erp_response.status.is_success() {
        StatusCode::OK
    } else {
        erp_response.status
    };
    let mut response = Response::new(Body::from(erp_response.body));
    *response.status_mut() = status;
    if let Some(value) = erp_response
        .content_type
        .and_then(|content_type| content_type.parse().ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};

    #[tokio::test]
    async fn test_forward_keeps_body_and_normalises_success() {
        let erp = ErpResponse {
            status: StatusCode::CREATED,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: Bytes::from_static(br#"{"result": 5}"#),
        };
        let response = forward(erp);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, Bytes::from_static(br#"{"result": 5}"#));
    }

    #[tokio::test]
    async fn test_forward_passes_erp_error_status() {
        let erp = ErpResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: None,
            body: Bytes::from_static(b"Internal Server Error"),
        };
        let response = forward(erp);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"Internal Server Error"));
    }
}
