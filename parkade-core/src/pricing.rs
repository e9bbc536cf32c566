use std::collections::HashMap;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use crate::models::ResourceType;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Hourly rates per resource type, loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Currency units per hour
    pub hourly_rates: HashMap<ResourceType, f64>,

    /// Charge every started hour as a full hour
    #[serde(default)]
    pub bill_whole_hours: bool,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            hourly_rates: {
                let mut m = HashMap::new();
                m.insert(ResourceType::Car, 60.0);
                m.insert(ResourceType::Bike, 30.0);
                m
            },
            bill_whole_hours: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeeError {
    #[error("No hourly rate configured for resource type {0}")]
    UnpricedResourceType(ResourceType),
}

/// Pure pricing function from (resource type, parked duration) to an amount.
#[derive(Debug, Clone)]
pub struct FeePolicy {
    schedule: FeeSchedule,
}

impl FeePolicy {
    pub fn new(schedule: FeeSchedule) -> Self {
        Self { schedule }
    }

    pub fn rate(&self, resource_type: ResourceType) -> Option<f64> {
        self.schedule.hourly_rates.get(&resource_type).copied()
    }

    /// Fee for holding a slot of `resource_type` for `duration`.
    ///
    /// Negative durations count as zero. The result is not rounded; presenting it
    /// with two decimals is up to the caller.
    pub fn fee(&self, resource_type: ResourceType, duration: Duration) -> Result<f64, FeeError> {
        let rate = self
            .rate(resource_type)
            .ok_or(FeeError::UnpricedResourceType(resource_type))?;

        let millis = duration.num_milliseconds().max(0);
        let mut hours = millis as f64 / MILLIS_PER_HOUR;
        if self.schedule.bill_whole_hours {
            hours = hours.ceil();
        }

        Ok(rate * hours)
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::new(FeeSchedule::default())
    }
}
