//! Fault report form logic.
//!
//! Mirrors what the QR-code page does, minus rendering: read the device id and
//! access key from the page URL, keep the key for the session, validate input,
//! send exactly one report per submission and turn the relay's reply into a
//! notice for the reporter. Browser storage and the network are injected
//! through [`SessionStore`] and [`ReportSender`].

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ReportRequest;
use crate::ticket::Priority;

const RELAY_PATH: &str = "/api/odoo-report";

// ============================================================================
// Injected capabilities
// ============================================================================

/// Browser-side persistence used by the form.
///
/// The access key lives in session scope; the banner flag is permanent.
pub trait SessionStore {
    fn access_key(&self) -> Option<String>;
    fn set_access_key(&mut self, key: &str);
    fn banner_acknowledged(&self) -> bool;
    fn set_banner_acknowledged(&mut self);
}

/// In-memory [`SessionStore`] for tests and headless use.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    access_key: Option<String>,
    banner_acknowledged: bool,
}

impl MemorySessionStore {
    /// Start a new browsing session: session-scoped values are dropped,
    /// permanent ones are kept.
    pub fn new_session(&self) -> Self {
        Self {
            access_key: None,
            banner_acknowledged: self.banner_acknowledged,
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn access_key(&self) -> Option<String> {
        self.access_key.clone()
    }

    fn set_access_key(&mut self, key: &str) {
        self.access_key = Some(key.to_string());
    }

    fn banner_acknowledged(&self) -> bool {
        self.banner_acknowledged
    }

    fn set_banner_acknowledged(&mut self) {
        self.banner_acknowledged = true;
    }
}

/// Relay reply as seen by the form.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReply {
    pub status: StatusCode,
    /// Parsed JSON body, or `None` when the body was not JSON.
    pub body: Option<Value>,
}

#[derive(Debug, Error)]
#[error("could not reach the report relay: {0}")]
pub struct SendError(#[from] pub reqwest::Error);

#[derive(Debug, Error)]
pub enum FormError {
    #[error("invalid page URL: {0}")]
    InvalidPageUrl(String),
}

/// Delivers a report to the relay.
#[async_trait]
pub trait ReportSender: Send + Sync {
    async fn send(&self, report: &ReportRequest) -> Result<RelayReply, SendError>;
}

/// [`ReportSender`] that posts to the relay over HTTP.
pub struct HttpReportSender {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpReportSender {
    /// `base_url` is the relay origin, e.g. `https://relay.example.com`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RELAY_PATH),
        }
    }
}

#[async_trait]
impl ReportSender for HttpReportSender {
    async fn send(&self, report: &ReportRequest) -> Result<RelayReply, SendError> {
        let response = self.http.post(&self.endpoint).json(report).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).ok();
        Ok(RelayReply { status, body })
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Feedback shown to the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Page opened without a key and none is stored for the session.
    AccessDenied,
    MissingDescription,
    /// Submit pressed without a stored key.
    MissingKey,
    SubmissionInProgress,
    Submitted { device_id: String },
    Failed { message: String },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::AccessDenied => "Access denied",
            Notice::MissingDescription => "Missing description",
            Notice::MissingKey => "Unauthorized access",
            Notice::SubmissionInProgress => "Sending...",
            Notice::Submitted { .. } => "Report sent!",
            Notice::Failed { .. } => "Error sending report",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::AccessDenied => "You do not have permission to access this form.".to_string(),
            Notice::MissingDescription => {
                "Please write a short description of the problem.".to_string()
            }
            Notice::MissingKey => {
                "No access key was found. Please scan the QR code to sign in.".to_string()
            }
            Notice::SubmissionInProgress => "A report is already being sent.".to_string(),
            Notice::Submitted { device_id } => {
                format!("Device {} was reported successfully.", device_id)
            }
            Notice::Failed { message } => message.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Notice::Submitted { .. })
    }
}

/// Result of reading the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoad {
    pub device_id: Option<String>,
    /// URL to show in the address bar once the key has been removed. `None`
    /// when the URL carried no key and can stay as it is.
    pub clean_url: Option<String>,
    pub notice: Option<Notice>,
}

// ============================================================================
// Form state
// ============================================================================

/// Editable form state plus the injected session store.
#[derive(Debug)]
pub struct ReportForm<S> {
    store: S,
    device_id: Option<String>,
    description: String,
    priority: Priority,
    submitting: bool,
}

impl<S: SessionStore> ReportForm<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            device_id: None,
            description: String::new(),
            priority: Priority::default(),
            submitting: false,
        }
    }

    /// Read `id` and `key` from the page URL.
    ///
    /// A key found in the URL replaces the stored one and is stripped from the
    /// visible URL, keeping only the device id. Missing access is reported but
    /// does not block editing.
    pub fn load(&mut self, page_url: &str) -> Result<PageLoad, FormError> {
        let url =
            Url::parse(page_url).map_err(|e| FormError::InvalidPageUrl(e.to_string()))?;
        let mut device_id = None;
        let mut key = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "id" if !value.is_empty() => device_id = Some(value.into_owned()),
                "key" if !value.is_empty() => key = Some(value.into_owned()),
                _ => {}
            }
        }

        let mut clean_url = None;
        let mut notice = None;
        match key {
            Some(key) => {
                self.store.set_access_key(&key);
                let mut cleaned = url.clone();
                cleaned.set_fragment(None);
                cleaned.set_query(None);
                if let Some(id) = &device_id {
                    cleaned.query_pairs_mut().append_pair("id", id);
                }
                clean_url = Some(cleaned.to_string());
            }
            None if self.store.access_key().is_none() => {
                warn!("Form opened without an access key");
                notice = Some(Notice::AccessDenied);
            }
            None => {}
        }

        if device_id.is_some() {
            self.device_id = device_id.clone();
        }

        Ok(PageLoad {
            device_id,
            clean_url,
            notice,
        })
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Returns `false` when the edit was ignored because a submission is in flight.
    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        if self.submitting {
            return false;
        }
        self.description = description.into();
        true
    }

    /// Returns `false` when the edit was ignored because a submission is in flight.
    pub fn select_priority(&mut self, priority: Priority) -> bool {
        if self.submitting {
            return false;
        }
        self.priority = priority;
        true
    }

    pub fn banner_visible(&self) -> bool {
        !self.store.banner_acknowledged()
    }

    pub fn acknowledge_banner(&mut self) {
        self.store.set_banner_acknowledged();
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate the form and mark a submission as in flight.
    ///
    /// On success the returned request must be sent and its outcome passed to
    /// [`finish_submit`](Self::finish_submit).
    pub fn begin_submit(&mut self) -> Result<ReportRequest, Notice> {
        if self.submitting {
            return Err(Notice::SubmissionInProgress);
        }
        if self.description.trim().is_empty() {
            return Err(Notice::MissingDescription);
        }
        let key = self.store.access_key().ok_or(Notice::MissingKey)?;

        self.submitting = true;
        Ok(ReportRequest {
            device_id: self.device_id.clone(),
            description: self.description.clone(),
            priority: Some(self.priority.level()),
            key: Some(key),
        })
    }

    /// Clear the in-flight flag and turn the relay outcome into a notice.
    /// Input is reset only on success.
    pub fn finish_submit(&mut self, outcome: Result<RelayReply, SendError>) -> Notice {
        self.submitting = false;

        let notice = match outcome {
            Ok(reply) => notice_for_reply(&reply, self.device_id.as_deref().unwrap_or_default()),
            Err(err) => {
                warn!("{}", err);
                Notice::Failed {
                    message: "There was a problem processing the report.".to_string(),
                }
            }
        };

        if notice.is_success() {
            self.description.clear();
            self.priority = Priority::default();
        }
        notice
    }

    /// Validate, send once through `sender`, and report the outcome.
    pub async fn submit<R>(&mut self, sender: &R) -> Notice
    where
        R: ReportSender + ?Sized,
    {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(notice) => return notice,
        };
        debug!("Submitting report for {:?}", request.device_id);
        let outcome = sender.send(&request).await;
        self.finish_submit(outcome)
    }
}

/// Relay errors carry `{"error": "..."}`; ERP errors tunnelled through a 2xx
/// reply carry a JSON-RPC `error` object. A 2xx reply that is not JSON did not
/// come from the ERP's RPC endpoint and is not a confirmation.
fn notice_for_reply(reply: &RelayReply, device_id: &str) -> Notice {
    if !reply.status.is_success() {
        let message = reply
            .body
            .as_ref()
            .and_then(|body| body.get("error"))
            .and_then(error_message)
            .unwrap_or_else(|| "The server rejected the request.".to_string());
        return Notice::Failed { message };
    }

    let Some(body) = &reply.body else {
        warn!("Relay answered {} with a non-JSON body", reply.status);
        return Notice::Failed {
            message: "The server returned an unexpected response.".to_string(),
        };
    };

    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error_message(error)
            .unwrap_or_else(|| "The maintenance system rejected the report.".to_string());
        return Notice::Failed { message };
    }

    Notice::Submitted {
        device_id: device_id.to_string(),
    }
}

fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::String(message) => Some(message.clone()),
        Value::Object(_) => error
            .pointer("/data/message")
            .or_else(|| error.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}
