//! Odoo JSON-RPC client.
//!
//! Tickets are created through the generic `object.execute_kw` service:
//!
//! ```text
//! {"jsonrpc": "2.0", "method": "call",
//!  "params": {"service": "object", "method": "execute_kw",
//!             "args": [db, uid, password, "maintenance.request", "create", [values]]}}
//! ```
//!
//! The response is handed back untouched so the caller can forward it.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::OdooConfig;
use crate::ticket::TicketPayload;

const MAINTENANCE_MODEL: &str = "maintenance.request";

/// The ERP could not be reached or its reply could not be read.
#[derive(Debug, Error)]
#[error("ERP request failed: {0}")]
pub struct ErpTransportError(#[from] pub reqwest::Error);

/// Raw ERP reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ErpResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl ErpResponse {
    /// A `200 application/json` reply, used by fakes and tests.
    pub fn json(body: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl JsonRpcRequest {
    /// `execute_kw` call against `model.method` with positional `args`.
    pub fn execute_kw(
        credentials: &OdooConfig,
        model: &str,
        method: &str,
        args: Value,
    ) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            params: json!({
                "service": "object",
                "method": "execute_kw",
                "args": [
                    credentials.database,
                    credentials.uid,
                    credentials.password,
                    model,
                    method,
                    args,
                ],
            }),
        }
    }

    pub fn create_maintenance_request(credentials: &OdooConfig, payload: &TicketPayload) -> Self {
        Self::execute_kw(credentials, MAINTENANCE_MODEL, "create", json!([payload]))
    }
}

/// Anything that can file a maintenance request with the ERP.
#[async_trait]
pub trait ErpClient: Send + Sync {
    async fn create_maintenance_request(
        &self,
        payload: &TicketPayload,
    ) -> Result<ErpResponse, ErpTransportError>;
}

/// [`ErpClient`] backed by Odoo's `/jsonrpc` endpoint.
///
/// One attempt per call; no retries and no request timeout.
pub struct OdooRpcClient {
    http: reqwest::Client,
    config: OdooConfig,
}

impl OdooRpcClient {
    pub fn new(config: OdooConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: OdooConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ErpClient for OdooRpcClient {
    async fn create_maintenance_request(
        &self,
        payload: &TicketPayload,
    ) -> Result<ErpResponse, ErpTransportError> {
        let request = JsonRpcRequest::create_maintenance_request(&self.config, payload);

        let response = self
            .http
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach ERP at {}: {}", self.config.url, e);
                ErpTransportError(e)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        debug!("ERP replied {} ({} bytes)", status, body.len());

        Ok(ErpResponse {
            status,
            content_type,
            body,
        })
    }
}
