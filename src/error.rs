//! Relay error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::erp::ErpTransportError;
use crate::models::ErrorBody;

/// Reasons a report is refused before, or instead of, reaching the ERP.
///
/// ERP-level failures that come back as an HTTP reply are not errors here:
/// they are forwarded to the caller unchanged.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or wrong shared secret.
    #[error("unauthorized access")]
    Unauthorized,

    /// Device id is not in the registry.
    #[error("unknown device")]
    UnknownDevice,

    /// Well-formed request with unacceptable field values.
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// Body could not be decoded as a report request.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The ERP could not be reached.
    #[error(transparent)]
    UpstreamUnavailable(#[from] ErpTransportError),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownDevice | Self::InvalidReport(_) | Self::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message shown to the reporter. Never includes the submitted key, the
    /// known device names, or transport internals.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized => "Unauthorized access".to_string(),
            Self::UnknownDevice => "Unrecognized device".to_string(),
            Self::InvalidReport(reason) => reason.clone(),
            Self::MalformedRequest(_) => "Malformed report request".to_string(),
            Self::UpstreamUnavailable(_) => "Maintenance system is unreachable".to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            RelayError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RelayError::UnknownDevice.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::InvalidReport("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::MalformedRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_unreachable_erp_is_bad_gateway() {
        let transport = reqwest::Client::new()
            .post("not a url")
            .send()
            .await
            .unwrap_err();
        let err = RelayError::from(ErpTransportError(transport));

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "Maintenance system is unreachable");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_messages_do_not_leak_details() {
        let err = RelayError::MalformedRequest("expected `,` at line 1 column 9".into());
        assert_eq!(err.public_message(), "Malformed report request");

        let response = RelayError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
