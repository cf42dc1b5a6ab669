//! Maintenance ticket payload sent to the ERP.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::category::FaultCategory;
use crate::registry::DeviceRecord;

/// Maintenance team every fault report is routed to.
pub const MAINTENANCE_TEAM_ID: i64 = 5;

const MAINTENANCE_TYPE: &str = "corrective";

/// Urgency selected by the reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn level(self) -> i64 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    /// Odoo stores priority as a selection of numeric strings.
    pub fn as_erp_str(self) -> &'static str {
        match self {
            Priority::Low => "1",
            Priority::Medium => "2",
            Priority::High => "3",
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = i64;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(other),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_erp_str())
    }
}

/// Assignee field of the ticket.
///
/// Odoo writes "no employee" as a literal `false`, never as `null` or `[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignee {
    Employee(i64),
    Unassigned,
}

impl From<Option<i64>> for Assignee {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Assignee::Unassigned, Assignee::Employee)
    }
}

impl Serialize for Assignee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Assignee::Employee(id) => serializer.serialize_i64(*id),
            Assignee::Unassigned => serializer.serialize_bool(false),
        }
    }
}

/// `maintenance.request` values for one fault report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketPayload {
    pub name: String,
    pub maintenance_type: &'static str,
    pub request_date: String,
    pub priority: Priority,
    pub category_id: Option<FaultCategory>,
    pub description: String,
    pub equipment_id: i64,
    pub maintenance_team_id: i64,
    pub employee_id: Assignee,
}

impl TicketPayload {
    /// Assemble the ticket for `device`. The title and category come from the
    /// reported device id, which has already been matched against the registry.
    pub fn new(
        device: &DeviceRecord,
        description: impl Into<String>,
        priority: Priority,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: format!("Falla en {}", device.name),
            maintenance_type: MAINTENANCE_TYPE,
            request_date: requested_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            priority,
            category_id: FaultCategory::from_device_id(&device.name),
            description: description.into(),
            equipment_id: device.id,
            maintenance_team_id: MAINTENANCE_TEAM_ID,
            employee_id: device.assignee.into(),
        }
    }
}
