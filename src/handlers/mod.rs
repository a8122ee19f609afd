//! Inbound message handling for the central system
//!
//! One [`CentralHandler`] per session. The action table is a single `match`
//! over the parsed [`Action`], fixed at compile time: no runtime handler
//! registration. Call frames produce a reply frame; CallResult/CallError
//! frames resolve the session's pending calls and produce nothing.

mod boot_notification;
mod heartbeat;
mod meter_values;

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::protocol::{Action, ErrorCode};
use crate::session::PendingCalls;
use crate::shared::frame::{OcppFrame, FrameError};
use crate::storage::{StationStore, TelemetryStore};

/// A handler-level failure that becomes a CallError reply.
#[derive(Debug)]
pub(crate) struct CallFault {
    code: ErrorCode,
    description: String,
}

impl CallFault {
    pub(crate) fn format(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::FormatViolation,
            description: description.into(),
        }
    }

    pub(crate) fn not_implemented(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotImplemented,
            description: description.into(),
        }
    }

    pub(crate) fn internal(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            description: description.into(),
        }
    }
}

/// Per-session handler for frames received from a station.
pub struct CentralHandler {
    pub station_id: String,
    pub(crate) stations: Arc<StationStore>,
    pub(crate) telemetry: Arc<TelemetryStore>,
    pending: Arc<PendingCalls>,
    pub(crate) heartbeat_interval: u32,
}

impl CentralHandler {
    pub fn new(
        station_id: impl Into<String>,
        stations: Arc<StationStore>,
        telemetry: Arc<TelemetryStore>,
        pending: Arc<PendingCalls>,
        heartbeat_interval: u32,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            stations,
            telemetry,
            pending,
            heartbeat_interval,
        }
    }

    /// Process one inbound text frame. Returns the reply frame to write, if
    /// any. Never errors: protocol violations are answered or dropped here.
    pub async fn handle(&self, text: &str) -> Option<String> {
        match OcppFrame::parse(text) {
            Ok(OcppFrame::Call {
                message_id,
                action,
                payload,
            }) => Some(self.handle_call(&message_id, &action, payload)),
            Ok(OcppFrame::CallResult {
                message_id,
                payload,
            }) => {
                if !self.pending.resolve(&message_id, payload) {
                    warn!(
                        station_id = self.station_id.as_str(),
                        message_id = message_id.as_str(),
                        "CallResult for unknown message id, dropping"
                    );
                }
                None
            }
            Ok(OcppFrame::CallError {
                message_id,
                error_code,
                error_description,
                ..
            }) => {
                if !self.pending.reject(&message_id, &error_code, &error_description) {
                    warn!(
                        station_id = self.station_id.as_str(),
                        message_id = message_id.as_str(),
                        error_code = error_code.as_str(),
                        "CallError for unknown message id, dropping"
                    );
                }
                None
            }
            Err(e) => self.handle_decode_error(text, e),
        }
    }

    /// A malformed frame that is recognizably a Call gets a CallError reply;
    /// anything else is logged and dropped.
    fn handle_decode_error(&self, text: &str, error: FrameError) -> Option<String> {
        match OcppFrame::faulty_call_id(text) {
            Some(message_id) => {
                warn!(
                    station_id = self.station_id.as_str(),
                    message_id = message_id.as_str(),
                    error = %error,
                    "Malformed Call frame, answering with CallError"
                );
                Some(
                    OcppFrame::error_response(
                        message_id,
                        ErrorCode::ProtocolError.as_str(),
                        error.to_string(),
                    )
                    .serialize(),
                )
            }
            None => {
                warn!(
                    station_id = self.station_id.as_str(),
                    error = %error,
                    "Dropping undecodable frame"
                );
                None
            }
        }
    }

    fn handle_call(&self, message_id: &str, action: &str, payload: Value) -> String {
        info!(
            station_id = self.station_id.as_str(),
            action, message_id, "Inbound call"
        );

        let outcome = match action.parse::<Action>() {
            Ok(Action::BootNotification) => boot_notification::handle(self, payload),
            Ok(Action::Heartbeat) => heartbeat::handle(self),
            Ok(Action::MeterValues) => meter_values::handle(self, payload),
            Ok(other) => Err(CallFault::not_implemented(format!(
                "{} is not handled by the central system",
                other
            ))),
            Err(unknown) => Err(CallFault::not_implemented(format!(
                "unknown action {}",
                unknown.0
            ))),
        };

        match outcome {
            Ok(reply) => OcppFrame::CallResult {
                message_id: message_id.to_string(),
                payload: reply,
            }
            .serialize(),
            Err(fault) => {
                warn!(
                    station_id = self.station_id.as_str(),
                    action,
                    code = fault.code.as_str(),
                    description = fault.description.as_str(),
                    "Answering call with CallError"
                );
                OcppFrame::error_response(
                    message_id,
                    fault.code.as_str(),
                    fault.description,
                )
                .serialize()
            }
        }
    }
}
