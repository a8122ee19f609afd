//! Append-only telemetry store
//!
//! Meter readings are keyed by station id and kept in arrival order. Records
//! are never mutated or deleted while the process runs.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// One sampled value inside a meter reading.
#[derive(Debug, Clone, Serialize)]
pub struct SampledValue {
    /// Raw value as reported, kept verbatim.
    pub value: String,
    pub measurand: String,
    pub unit: String,
    pub multiplier: i32,
}

/// One telemetry record from a MeterValues batch entry.
#[derive(Debug, Clone, Serialize)]
pub struct MeterReading {
    pub evse_id: u32,
    pub timestamp: DateTime<Utc>,
    pub sampled_values: Vec<SampledValue>,
}

/// Per-station append-only log of meter readings.
pub struct TelemetryStore {
    readings: DashMap<String, Vec<MeterReading>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self {
            readings: DashMap::new(),
        }
    }

    pub fn append(&self, station_id: &str, reading: MeterReading) {
        self.readings
            .entry(station_id.to_string())
            .or_default()
            .push(reading);
    }

    /// Full history for a station in arrival order. Empty if none recorded.
    pub fn history(&self, station_id: &str) -> Vec<MeterReading> {
        self.readings
            .get(station_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, station_id: &str) -> usize {
        self.readings.get(station_id).map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
