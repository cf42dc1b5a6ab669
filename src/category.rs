//! Fault category derived from the device naming convention.
//!
//! Device names follow `<PREFIX>-<CLASS>-<NUMBER>`. The class marker decides
//! which ERP maintenance category a fault lands in. Rules are checked in order
//! and the first marker found anywhere in the name wins.

use serde::{Serialize, Serializer};

/// ERP `maintenance.equipment.category` the ticket is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCategory {
    AllInOne,
    Notebook,
    Tablet,
}

const RULES: [(&str, FaultCategory); 3] = [
    ("AIO", FaultCategory::AllInOne),
    ("NB", FaultCategory::Notebook),
    ("TAB", FaultCategory::Tablet),
];

impl FaultCategory {
    /// Classify a device name. Names without any known marker have no category.
    pub fn from_device_id(device_id: &str) -> Option<Self> {
        RULES
            .iter()
            .find(|(marker, _)| device_id.contains(marker))
            .map(|(_, category)| *category)
    }

    /// Category id in the ERP.
    pub fn erp_id(self) -> i64 {
        match self {
            FaultCategory::AllInOne => 1,
            FaultCategory::Notebook => 2,
            FaultCategory::Tablet => 3,
        }
    }
}

impl Serialize for FaultCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.erp_id())
    }
}
