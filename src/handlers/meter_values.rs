//! MeterValues ingestion
//!
//! Parses the batch by hand instead of deserializing into
//! [`crate::protocol::MeterValuesRequest`]: stations in the field send
//! partially broken batches, and one bad entry must not discard the rest.
//! The top-level shape (`evseId`, `meterValue` array) is still mandatory;
//! below that, entries degrade gracefully.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{CallFault, CentralHandler};
use crate::storage::{MeterReading, SampledValue};

pub(super) fn handle(ctx: &CentralHandler, payload: Value) -> Result<Value, CallFault> {
    let evse_id = payload
        .get("evseId")
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| CallFault::format("evseId missing or out of range"))?;
    let entries = payload
        .get("meterValue")
        .and_then(Value::as_array)
        .ok_or_else(|| CallFault::format("meterValue missing or not an array"))?;

    let received_at = Utc::now();
    let mut stored = 0usize;
    for entry in entries {
        let Some(entry) = entry.as_object() else {
            warn!(
                station_id = ctx.station_id.as_str(),
                "Skipping non-object meterValue entry"
            );
            continue;
        };
        let Some(timestamp) = entry_timestamp(entry, received_at) else {
            warn!(
                station_id = ctx.station_id.as_str(),
                "Skipping meterValue entry with unparseable timestamp"
            );
            continue;
        };

        let sampled_values = entry
            .get("sampledValue")
            .and_then(Value::as_array)
            .map(|samples| samples.iter().map(parse_sample).collect())
            .unwrap_or_default();

        ctx.telemetry.append(
            &ctx.station_id,
            MeterReading {
                evse_id,
                timestamp,
                sampled_values,
            },
        );
        stored += 1;
    }

    info!(
        station_id = ctx.station_id.as_str(),
        evse_id,
        received = entries.len(),
        stored,
        "Meter values"
    );

    Ok(json!({}))
}

/// Entry timestamp: RFC 3339 string, or the arrival time when absent.
/// A present-but-unparseable timestamp disqualifies the entry.
fn entry_timestamp(
    entry: &Map<String, Value>,
    received_at: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match entry.get("timestamp") {
        None | Some(Value::Null) => Some(received_at),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(_) => None,
    }
}

/// A sample never fails to parse: missing pieces fall back to placeholders
/// so the raw report stays queryable.
fn parse_sample(sample: &Value) -> SampledValue {
    let value = match sample.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "N/A".to_string(),
    };
    let measurand = sample
        .get("measurand")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();
    let unit_of_measure = sample.get("unitOfMeasure");
    let unit = unit_of_measure
        .and_then(|u| u.get("unit"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();
    let multiplier = unit_of_measure
        .and_then(|u| u.get("multiplier"))
        .and_then(Value::as_i64)
        .unwrap_or(0) as i32;

    SampledValue {
        value,
        measurand,
        unit,
        multiplier,
    }
}
