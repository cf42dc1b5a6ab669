//! The report relay: authorize, resolve, build the ticket, forward it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::erp::{ErpClient, ErpResponse};
use crate::error::RelayError;
use crate::models::ReportRequest;
use crate::registry::DeviceRegistry;
use crate::ticket::{Priority, TicketPayload};

/// Stateless relay shared by every request handler.
#[derive(Clone)]
pub struct ReportRelay {
    report_key: Arc<str>,
    registry: Arc<DeviceRegistry>,
    erp: Arc<dyn ErpClient>,
}

impl ReportRelay {
    pub fn new(
        report_key: impl Into<Arc<str>>,
        registry: Arc<DeviceRegistry>,
        erp: Arc<dyn ErpClient>,
    ) -> Self {
        Self {
            report_key: report_key.into(),
            registry,
            erp,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Turn one report into an ERP maintenance request.
    ///
    /// Checks run in a fixed order: secret, field values, device lookup. The
    /// ERP is only contacted once all of them pass, exactly once, and its
    /// reply is returned as received.
    pub async fn submit_report(&self, report: ReportRequest) -> Result<ErpResponse, RelayError> {
        if report.key.as_deref() != Some(&*self.report_key) {
            warn!("Rejected report with missing or invalid key");
            return Err(RelayError::Unauthorized);
        }

        if report.description.trim().is_empty() {
            warn!("Rejected report without description");
            return Err(RelayError::InvalidReport(
                "Description must not be empty".to_string(),
            ));
        }

        let priority = match report.priority {
            None => Priority::default(),
            Some(level) => Priority::try_from(level).map_err(|level| {
                warn!("Rejected report with priority {}", level);
                RelayError::InvalidReport("Priority must be 1, 2 or 3".to_string())
            })?,
        };

        let device_id = report.device_id.as_deref().unwrap_or_default();
        let device = self.registry.resolve(device_id).ok_or_else(|| {
            warn!("Rejected report for unknown device {:?}", device_id);
            RelayError::UnknownDevice
        })?;

        let payload = TicketPayload::new(device, report.description, priority, Utc::now());
        debug!("Ticket payload: {:?}", payload);

        let response = self.erp.create_maintenance_request(&payload).await?;
        info!(
            "Forwarded fault report for {} to ERP, status {}",
            device.name, response.status
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erp::ErpTransportError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records every payload it is handed and answers with a fixed result.
    #[derive(Default)]
    struct RecordingErp {
        calls: Mutex<Vec<Value>>,
    }

    impl RecordingErp {
        fn calls(&self) -> Vec<Value> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ErpClient for RecordingErp {
        async fn create_maintenance_request(
            &self,
            payload: &TicketPayload,
        ) -> Result<ErpResponse, ErpTransportError> {
            self.calls
                .lock()
                .unwrap()
                .push(serde_json::to_value(payload).unwrap());
            Ok(ErpResponse::json(
                &json!({"jsonrpc": "2.0", "id": null, "result": 118}),
            ))
        }
    }

    fn relay() -> (ReportRelay, Arc<RecordingErp>) {
        let registry = DeviceRegistry::from_yaml_str(
            r#"
- {name: KRETZ-AIO-036, id: 42, employee_id: [7]}
- {name: KRETZ-TAB-002, id: 44, employee_id: []}
"#,
        )
        .unwrap();
        let erp = Arc::new(RecordingErp::default());
        (
            ReportRelay::new("valid-key", Arc::new(registry), erp.clone()),
            erp,
        )
    }

    fn report(device_id: &str, key: &str) -> ReportRequest {
        ReportRequest {
            device_id: Some(device_id.to_string()),
            description: "Pantalla no enciende".to_string(),
            priority: Some(3),
            key: Some(key.to_string()),
        }
    }

    #[tokio::test]
    async fn test_wrong_key_never_reaches_erp() {
        let (relay, erp) = relay();
        let err = relay
            .submit_report(report("KRETZ-AIO-036", "guess"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
        assert_eq!(erp.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let (relay, erp) = relay();
        let mut request = report("KRETZ-AIO-036", "");
        request.key = None;
        let err = relay.submit_report(request).await.unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
        assert_eq!(erp.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_device_never_reaches_erp() {
        let (relay, erp) = relay();
        let err = relay
            .submit_report(report("KRETZ-AIO-999", "valid-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::UnknownDevice));
        assert_eq!(erp.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_bad_key_wins_over_unknown_device() {
        let (relay, erp) = relay();
        let err = relay
            .submit_report(report("NOT-A-DEVICE", "guess"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
        assert_eq!(erp.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_blank_description_rejected() {
        let (relay, erp) = relay();
        let mut request = report("KRETZ-AIO-036", "valid-key");
        request.description = " \n\t".to_string();
        let err = relay.submit_report(request).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidReport(_)));
        assert_eq!(erp.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_priority_rejected() {
        let (relay, erp) = relay();
        for level in [0, 4, -1] {
            let mut request = report("KRETZ-AIO-036", "valid-key");
            request.priority = Some(level);
            let err = relay.submit_report(request).await.unwrap_err();
            assert!(matches!(err, RelayError::InvalidReport(_)));
        }
        assert_eq!(erp.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_payload() {
        let (relay, erp) = relay();
        let response = relay
            .submit_report(report("KRETZ-AIO-036", "valid-key"))
            .await
            .unwrap();
        assert_eq!(
            response.body,
            json!({"jsonrpc": "2.0", "id": null, "result": 118}).to_string()
        );

        let calls = erp.calls();
        assert_eq!(calls.len(), 1);
        let mut sent = calls[0].clone();
        assert!(sent["request_date"].as_str().unwrap().ends_with('Z'));
        sent.as_object_mut().unwrap().remove("request_date");
        assert_eq!(
            sent,
            json!({
                "name": "Falla en KRETZ-AIO-036",
                "maintenance_type": "corrective",
                "priority": "3",
                "category_id": 1,
                "description": "Pantalla no enciende",
                "equipment_id": 42,
                "maintenance_team_id": 5,
                "employee_id": 7
            })
        );
    }

    #[tokio::test]
    async fn test_omitted_priority_defaults_to_medium() {
        let (relay, erp) = relay();
        let mut request = report("KRETZ-TAB-002", "valid-key");
        request.priority = None;
        relay.submit_report(request).await.unwrap();

        let calls = erp.calls();
        assert_eq!(calls[0]["priority"], json!("2"));
        assert_eq!(calls[0]["employee_id"], json!(false));
        assert_eq!(calls[0]["category_id"], json!(3));
    }
}
