//! Metric catalog exposed to the host platform
//!
//! The host registers one entity per descriptor and reads values through the
//! typed accessors; forecast payloads (today's and tomorrow's entry lists)
//! are attribute payloads rather than scalar values.

use serde::Serialize;

use crate::coordinator::Snapshot;
use crate::normalize::PriceEntry;

/// Integration identifier used for entity and device naming
pub const DOMAIN: &str = "elektra";

/// Upstream attribution string attached to every snapshot
pub const ATTRIBUTION: &str = "Data provided by Ostrom GmbH";

pub const MANUFACTURER: &str = "Ostrom";
pub const MODEL: &str = "Energy Price API";

/// One scalar metric derived from the snapshot
pub struct MetricDescriptor {
    /// Stable identifier the host keys entities by
    pub key: &'static str,

    /// Display name
    pub name: &'static str,

    /// Display unit
    pub unit: &'static str,

    /// Diagnostic metrics sit outside the primary dashboard
    pub diagnostic: bool,

    /// Accessor into the snapshot; None when currently unavailable
    pub value: fn(&Snapshot) -> Option<f64>,
}

/// Full scalar catalog, prices first, fees after
pub const METRICS: &[MetricDescriptor] = &[
    MetricDescriptor {
        key: "current_price",
        name: "Current Price",
        unit: "€/kWh",
        diagnostic: false,
        value: |s| Some(s.current_price),
    },
    MetricDescriptor {
        key: "next_hour_price",
        name: "Next Hour Price",
        unit: "€/kWh",
        diagnostic: false,
        value: |s| s.next_hour_price,
    },
    MetricDescriptor {
        key: "lowest_price_today",
        name: "Lowest Price Today",
        unit: "€/kWh",
        diagnostic: false,
        value: |s| Some(s.lowest_price_today),
    },
    MetricDescriptor {
        key: "highest_price_today",
        name: "Highest Price Today",
        unit: "€/kWh",
        diagnostic: false,
        value: |s| Some(s.highest_price_today),
    },
    MetricDescriptor {
        key: "base_fee",
        name: "Monthly Base Fee",
        unit: "€",
        diagnostic: true,
        value: |s| Some(s.base_fee),
    },
    MetricDescriptor {
        key: "grid_fee",
        name: "Monthly Grid Fee",
        unit: "€",
        diagnostic: true,
        value: |s| Some(s.grid_fee),
    },
];

/// Look up a descriptor by its stable key
pub fn find_metric(key: &str) -> Option<&'static MetricDescriptor> {
    METRICS.iter().find(|m| m.key == key)
}

/// Evaluate the whole catalog against a snapshot
pub fn metric_values(snapshot: &Snapshot) -> Vec<(&'static str, Option<f64>)> {
    METRICS
        .iter()
        .map(|m| (m.key, (m.value)(snapshot)))
        .collect()
}

/// Today's forecast payload
pub fn forecast_today(snapshot: &Snapshot) -> &[PriceEntry] {
    &snapshot.prices_today
}

/// Tomorrow's forecast payload
pub fn forecast_tomorrow(snapshot: &Snapshot) -> &[PriceEntry] {
    &snapshot.prices_tomorrow
}

/// Host-facing device identity for one configured instance
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

impl DeviceInfo {
    /// Identity derived from the instance's postal code
    pub fn for_zip(zip_code: &str) -> Self {
        Self {
            identifier: format!("{}_{}", DOMAIN, zip_code),
            name: format!("Ostrom Energy ({})", zip_code),
            manufacturer: MANUFACTURER,
            model: MODEL,
        }
    }
}
