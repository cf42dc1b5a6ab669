//! Static device registry.
//!
//! Maps a device name such as `KRETZ-AIO-036` to the ERP equipment it belongs
//! to and the employee who should be assigned to its maintenance requests. The
//! registry is read once at startup and never mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::de::{Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors raised while loading the registry file.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read device registry {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse device registry: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("duplicate device name in registry: {0}")]
    DuplicateName(String),
}

/// One device known to the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    /// ERP `maintenance.equipment` id.
    pub id: i64,
    /// ERP `hr.employee` id of the default assignee, if any.
    #[serde(rename = "employee_id", default, deserialize_with = "deserialize_assignee")]
    pub assignee: Option<i64>,
}

/// Shapes Odoo uses for a many2one field: `false`, `[id]` or `[id, "Display Name"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Many2One {
    Unset(bool),
    Pair(Vec<Many2OneItem>),
    Id(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Many2OneItem {
    Id(i64),
    Other(IgnoredAny),
}

fn deserialize_assignee<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Many2One>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Many2One::Unset(false)) => None,
        Some(Many2One::Unset(true)) => {
            return Err(D::Error::custom(
                "employee_id may be `false` but not `true`",
            ))
        }
        Some(Many2One::Id(id)) => Some(id),
        Some(Many2One::Pair(items)) => match items.first() {
            Some(Many2OneItem::Id(id)) => Some(*id),
            _ => None,
        },
    })
}

/// Immutable lookup table keyed by exact device name.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, DeviceRecord>,
}

impl DeviceRegistry {
    /// Build a registry from records, rejecting duplicate names.
    pub fn new(records: Vec<DeviceRecord>) -> Result<Self, RegistryError> {
        let mut devices = HashMap::with_capacity(records.len());
        for record in records {
            if devices.contains_key(&record.name) {
                return Err(RegistryError::DuplicateName(record.name));
            }
            devices.insert(record.name.clone(), record);
        }
        Ok(Self { devices })
    }

    /// Parse a YAML (or JSON) list of device records.
    pub fn from_yaml_str(source: &str) -> Result<Self, RegistryError> {
        let records: Vec<DeviceRecord> = serde_yaml::from_str(source)?;
        Self::new(records)
    }

    /// Load the registry file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    /// Exact, case-sensitive lookup.
    pub fn resolve(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.devices.get(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
