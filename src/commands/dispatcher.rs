//! Typed command facade for the control surface
//!
//! The single entry point through which an external control layer (HTTP or
//! otherwise) drives connected stations. Each method builds the wire payload,
//! sends it through [`CommandSender`], and normalizes the reply to the
//! station's acknowledgment status.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::commands::{CommandError, SharedCommandSender};
use crate::protocol::{
    Action, ChangeAvailabilityRequest, ChargingProfile, ChargingSchedule,
    ChargingSchedulePeriod, Evse, IdToken, RequestStartTransactionRequest,
    RequestStopTransactionRequest, SetChargingProfileRequest, StatusResponse,
};
use crate::storage::{OperationalStatus, StationStore};

/// Record command dispatch latency and volume.
fn record_command_latency(action: &'static str, start: std::time::Instant) {
    let duration = start.elapsed().as_secs_f64();
    metrics::histogram!("ocpp_command_latency_seconds", "action" => action).record(duration);
    metrics::counter!("ocpp_commands_total", "action" => action).increment(1);
}

pub struct CommandDispatcher {
    command_sender: SharedCommandSender,
    stations: Arc<StationStore>,
    call_timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(
        command_sender: SharedCommandSender,
        stations: Arc<StationStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            command_sender,
            stations,
            call_timeout,
        }
    }

    /// Raw send with an explicit per-call deadline. The typed methods below
    /// use the dispatcher's configured timeout.
    pub async fn send(
        &self,
        station_id: &str,
        action: Action,
        payload: Value,
        deadline: Duration,
    ) -> Result<Value, CommandError> {
        self.command_sender
            .send_command(station_id, action, payload, deadline)
            .await
    }

    fn status_of(reply: Value) -> Result<String, CommandError> {
        let parsed: StatusResponse = serde_json::from_value(reply)
            .map_err(|e| CommandError::InvalidResponse(e.to_string()))?;
        Ok(parsed.status)
    }

    // ─── RequestStartTransaction ───────────────────────────────────────

    pub async fn request_start_transaction(
        &self,
        station_id: &str,
        id_token: &str,
        evse_id: u32,
    ) -> Result<String, CommandError> {
        let start = std::time::Instant::now();
        info!(station_id, id_token, evse_id, "Dispatching RequestStartTransaction");

        let payload = RequestStartTransactionRequest {
            id_token: IdToken {
                id_token: id_token.to_string(),
                token_type: "ISO14443".to_string(),
            },
            remote_start_id: Some(1),
            evse_id,
        };
        let result = self
            .send(
                station_id,
                Action::RequestStartTransaction,
                serde_json::to_value(&payload).unwrap_or_default(),
                self.call_timeout,
            )
            .await
            .and_then(Self::status_of);
        record_command_latency("request_start_transaction", start);
        result
    }

    // ─── RequestStopTransaction ────────────────────────────────────────

    pub async fn request_stop_transaction(
        &self,
        station_id: &str,
        transaction_id: &str,
    ) -> Result<String, CommandError> {
        let start = std::time::Instant::now();
        info!(station_id, transaction_id, "Dispatching RequestStopTransaction");

        let payload = RequestStopTransactionRequest {
            transaction_id: transaction_id.to_string(),
        };
        let result = self
            .send(
                station_id,
                Action::RequestStopTransaction,
                serde_json::to_value(&payload).unwrap_or_default(),
                self.call_timeout,
            )
            .await
            .and_then(Self::status_of);
        record_command_latency("request_stop_transaction", start);
        result
    }

    // ─── ChangeAvailability ────────────────────────────────────────────

    /// The station's acknowledgment alone does not change central state; an
    /// `Accepted` outcome is what flips the station's stored status.
    pub async fn change_availability(
        &self,
        station_id: &str,
        status: OperationalStatus,
        evse_id: u32,
        connector_id: u32,
    ) -> Result<String, CommandError> {
        let start = std::time::Instant::now();
        info!(station_id, %status, evse_id, "Dispatching ChangeAvailability");

        let payload = ChangeAvailabilityRequest {
            operational_status: status.as_str().to_string(),
            evse: Some(Evse {
                id: evse_id,
                connector_id: Some(connector_id),
            }),
        };
        let result = self
            .send(
                station_id,
                Action::ChangeAvailability,
                serde_json::to_value(&payload).unwrap_or_default(),
                self.call_timeout,
            )
            .await
            .and_then(Self::status_of);

        if let Ok(reply_status) = &result {
            if reply_status == "Accepted" {
                self.stations.set_status(station_id, status);
            }
        }
        record_command_latency("change_availability", start);
        result
    }

    // ─── SetChargingProfile ────────────────────────────────────────────

    /// Builds a one-hour absolute TxProfile limiting the EVSE to `rate_kw`.
    pub async fn set_charging_profile(
        &self,
        station_id: &str,
        evse_id: u32,
        rate_kw: f64,
    ) -> Result<String, CommandError> {
        let start = std::time::Instant::now();
        info!(station_id, evse_id, rate_kw, "Dispatching SetChargingProfile");

        let payload = SetChargingProfileRequest {
            evse_id,
            charging_profile: ChargingProfile {
                id: 1,
                stack_level: 0,
                charging_profile_purpose: "TxProfile".to_string(),
                charging_profile_kind: "Absolute".to_string(),
                charging_schedule: vec![ChargingSchedule {
                    id: 1,
                    duration: Some(3600),
                    charging_rate_unit: "W".to_string(),
                    charging_schedule_period: vec![ChargingSchedulePeriod {
                        start_period: 0,
                        limit: rate_kw * 1000.0,
                        number_phases: Some(3),
                    }],
                }],
            },
        };
        let result = self
            .send(
                station_id,
                Action::SetChargingProfile,
                serde_json::to_value(&payload).unwrap_or_default(),
                self.call_timeout,
            )
            .await
            .and_then(Self::status_of);
        record_command_latency("set_charging_profile", start);
        result
    }
}

pub type SharedCommandDispatcher = Arc<CommandDispatcher>;

pub fn create_command_dispatcher(
    command_sender: SharedCommandSender,
    stations: Arc<StationStore>,
    call_timeout: Duration,
) -> SharedCommandDispatcher {
    Arc::new(CommandDispatcher::new(command_sender, stations, call_timeout))
}
