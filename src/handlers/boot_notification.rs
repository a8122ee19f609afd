use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::{CallFault, CentralHandler};
use crate::protocol::{BootNotificationRequest, BootNotificationResponse};
use crate::storage::BootInfo;

pub(super) fn handle(ctx: &CentralHandler, payload: Value) -> Result<Value, CallFault> {
    let request: BootNotificationRequest = serde_json::from_value(payload)
        .map_err(|e| CallFault::format(format!("invalid BootNotification payload: {}", e)))?;

    info!(
        station_id = ctx.station_id.as_str(),
        vendor = request.charging_station.vendor_name.as_deref().unwrap_or("-"),
        model = request.charging_station.model.as_str(),
        reason = request.reason.as_str(),
        "Boot notification"
    );

    ctx.stations.record_boot(
        &ctx.station_id,
        BootInfo {
            vendor: request.charging_station.vendor_name,
            model: request.charging_station.model,
            reason: request.reason,
        },
    );

    let response = BootNotificationResponse {
        current_time: Utc::now(),
        interval: ctx.heartbeat_interval,
        status: "Accepted".to_string(),
    };
    serde_json::to_value(response)
        .map_err(|e| CallFault::internal(format!("failed to encode response: {}", e)))
}
