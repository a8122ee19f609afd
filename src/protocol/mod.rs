//! OCPP 2.0.1 action vocabulary and message payloads
//!
//! Only the actions this system exchanges are modelled. Payload structs use
//! the wire's camelCase field names; telemetry ingestion deliberately does
//! not go through these types (see `handlers::meter_values`) so that one
//! malformed sample cannot reject a whole batch.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The actions understood by this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Station -> central
    BootNotification,
    Heartbeat,
    MeterValues,
    // Central -> station
    RequestStartTransaction,
    RequestStopTransaction,
    ChangeAvailability,
    SetChargingProfile,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::BootNotification => "BootNotification",
            Action::Heartbeat => "Heartbeat",
            Action::MeterValues => "MeterValues",
            Action::RequestStartTransaction => "RequestStartTransaction",
            Action::RequestStopTransaction => "RequestStopTransaction",
            Action::ChangeAvailability => "ChangeAvailability",
            Action::SetChargingProfile => "SetChargingProfile",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action name not in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BootNotification" => Ok(Action::BootNotification),
            "Heartbeat" => Ok(Action::Heartbeat),
            "MeterValues" => Ok(Action::MeterValues),
            "RequestStartTransaction" => Ok(Action::RequestStartTransaction),
            "RequestStopTransaction" => Ok(Action::RequestStopTransaction),
            "ChangeAvailability" => Ok(Action::ChangeAvailability),
            "SetChargingProfile" => Ok(Action::SetChargingProfile),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// OCPP-J error codes used in CallError frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    FormatViolation,
    NotImplemented,
    ProtocolError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FormatViolation => "FormatViolation",
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::ProtocolError => "ProtocolError",
            ErrorCode::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── BootNotification ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingStation {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

fn default_boot_reason() -> String {
    // Some stations omit the mandatory reason field.
    "PowerUp".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    pub charging_station: ChargingStation,
    #[serde(default = "default_boot_reason")]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub current_time: DateTime<Utc>,
    pub interval: u32,
    pub status: String,
}

// ── Heartbeat ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: DateTime<Utc>,
}

// ── MeterValues (outbound form; ingestion parses leniently) ────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOfMeasure {
    pub unit: String,
    pub multiplier: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSampledValue {
    pub value: f64,
    pub measurand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<UnitOfMeasure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMeterValue {
    pub timestamp: DateTime<Utc>,
    pub sampled_value: Vec<WireSampledValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValuesRequest {
    pub evse_id: u32,
    pub meter_value: Vec<WireMeterValue>,
}

// ── RequestStartTransaction / RequestStopTransaction ───────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdToken {
    pub id_token: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStartTransactionRequest {
    pub id_token: IdToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_start_id: Option<i32>,
    pub evse_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStopTransactionRequest {
    pub transaction_id: String,
}

/// Generic `{ "status": ... }` acknowledgment shared by the
/// central-initiated commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
}

// ── ChangeAvailability ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evse {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    pub operational_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse: Option<Evse>,
}

// ── SetChargingProfile ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedulePeriod {
    pub start_period: u32,
    pub limit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_phases: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    pub id: i32,
    pub duration: Option<u32>,
    pub charging_rate_unit: String,
    pub charging_schedule_period: Vec<ChargingSchedulePeriod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    pub id: i32,
    pub stack_level: i32,
    pub charging_profile_purpose: String,
    pub charging_profile_kind: String,
    pub charging_schedule: Vec<ChargingSchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileRequest {
    pub evse_id: u32,
    pub charging_profile: ChargingProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_roundtrips_through_str() {
        for action in [
            Action::BootNotification,
            Action::Heartbeat,
            Action::MeterValues,
            Action::RequestStartTransaction,
            Action::RequestStopTransaction,
            Action::ChangeAvailability,
            Action::SetChargingProfile,
        ] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(
            "Reset".parse::<Action>(),
            Err(UnknownAction("Reset".to_string()))
        );
    }

    #[test]
    fn boot_request_uses_wire_field_names() {
        let req = BootNotificationRequest {
            charging_station: ChargingStation {
                model: "RZG2L".into(),
                vendor_name: Some("Renesas Electronics".into()),
            },
            reason: "PowerUp".into(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["chargingStation"]["model"], "RZG2L");
        assert_eq!(value["chargingStation"]["vendorName"], "Renesas Electronics");
        assert_eq!(value["reason"], "PowerUp");
    }

    #[test]
    fn boot_request_defaults_missing_reason() {
        let req: BootNotificationRequest = serde_json::from_value(serde_json::json!({
            "chargingStation": {"model": "RZG2L"}
        }))
        .unwrap();
        assert_eq!(req.reason, "PowerUp");
    }

    #[test]
    fn id_token_type_field_is_renamed() {
        let req = RequestStartTransactionRequest {
            id_token: IdToken {
                id_token: "TEST1234".into(),
                token_type: "ISO14443".into(),
            },
            remote_start_id: Some(1),
            evse_id: 1,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["idToken"]["type"], "ISO14443");
        assert_eq!(value["idToken"]["idToken"], "TEST1234");
        assert_eq!(value["evseId"], 1);
    }
}
