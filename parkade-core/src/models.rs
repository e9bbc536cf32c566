use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type SlotId = i64;
pub type TicketId = i64;

/// Kind of vehicle a slot is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ResourceType {
    Car,
    Bike,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Car => "car",
            ResourceType::Bike => "bike",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource type: {0}")]
pub struct UnknownResourceType(pub String);

impl FromStr for ResourceType {
    type Err = UnknownResourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(ResourceType::Car),
            "bike" => Ok(ResourceType::Bike),
            other => Err(UnknownResourceType(other.to_string())),
        }
    }
}

/// A single parking slot. `occupied` is the only claimability flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub occupied: bool,
}

impl Slot {
    /// A new slot always starts free.
    pub fn new(id: SlotId, resource_type: ResourceType) -> Self {
        Self {
            id,
            resource_type,
            occupied: false,
        }
    }
}

/// Open allocation record: one vehicle holding one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub vehicle_id: String,
    pub slot_id: SlotId,
    pub entry_time: DateTime<Utc>,
}

/// Park request payload. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,
    pub resource_type: ResourceType,
}

impl Vehicle {
    pub fn new(vehicle_id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            resource_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: String,
    pub username: String,
    pub password_hash: String,
}
