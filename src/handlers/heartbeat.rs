use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::{CallFault, CentralHandler};
use crate::protocol::HeartbeatResponse;

pub(super) fn handle(ctx: &CentralHandler) -> Result<Value, CallFault> {
    debug!(station_id = ctx.station_id.as_str(), "Heartbeat");
    ctx.stations.touch_heartbeat(&ctx.station_id);

    let response = HeartbeatResponse {
        current_time: Utc::now(),
    };
    serde_json::to_value(response)
        .map_err(|e| CallFault::internal(format!("failed to encode response: {}", e)))
}
