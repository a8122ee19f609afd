//! Periodic meter value reporting
//!
//! One task per active transaction. The energy register starts at 1000 Wh
//! and grows by 100 Wh per sample, emitted immediately on start and then at
//! the configured interval until cancelled. The register is shared across
//! tasks, so a later transaction continues where the previous one ended.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::protocol::{
    Action, MeterValuesRequest, UnitOfMeasure, WireMeterValue, WireSampledValue,
};
use crate::shared::shutdown::ShutdownSignal;

use super::CallLink;

const STARTING_ENERGY_WH: u64 = 1000;
const ENERGY_STEP_WH: u64 = 100;

/// Cumulative Energy.Active.Import.Register reading in Wh.
///
/// A register meter only counts up, so this lives on the station rather
/// than the metering task: a new transaction picks up where the previous
/// one left off instead of resetting to the starting value.
#[derive(Clone)]
pub(crate) struct EnergyRegister(Arc<AtomicU64>);

impl EnergyRegister {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU64::new(STARTING_ENERGY_WH)))
    }

    /// Consume one step of energy and return the new register value.
    fn advance(&self) -> u64 {
        self.0.fetch_add(ENERGY_STEP_WH, Ordering::Relaxed) + ENERGY_STEP_WH
    }
}

/// Handle to a running metering loop.
pub(crate) struct MeterTask {
    cancel: ShutdownSignal,
    handle: JoinHandle<()>,
}

impl MeterTask {
    pub(crate) fn spawn(
        link: CallLink,
        evse_id: u32,
        interval: Duration,
        register: EnergyRegister,
    ) -> Self {
        let cancel = ShutdownSignal::new();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run_metering(link, evse_id, interval, register, task_cancel).await;
        });
        Self { cancel, handle }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub(crate) async fn stop(self) {
        self.cancel.trigger();
        if self.handle.await.is_ok() {
            info!("Meter task cancelled cleanly");
        }
    }
}

async fn run_metering(
    link: CallLink,
    evse_id: u32,
    interval: Duration,
    register: EnergyRegister,
    cancel: ShutdownSignal,
) {
    loop {
        if cancel.is_triggered() {
            return;
        }

        let energy_wh = register.advance() as f64;
        let payload = match sample_payload(evse_id, energy_wh) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to encode MeterValues: {}", e);
                return;
            }
        };

        info!(evse_id, energy_wh, "Sending meter values");
        tokio::select! {
            result = link.call(Action::MeterValues, payload) => {
                if let Err(e) = result {
                    warn!("Failed to send meter values: {}", e);
                }
            }
            _ = cancel.wait() => return,
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.wait() => return,
        }
    }
}

fn sample_payload(evse_id: u32, energy_wh: f64) -> Result<Value, serde_json::Error> {
    let request = MeterValuesRequest {
        evse_id,
        meter_value: vec![WireMeterValue {
            timestamp: Utc::now(),
            sampled_value: vec![WireSampledValue {
                value: energy_wh,
                measurand: "Energy.Active.Import.Register".to_string(),
                unit_of_measure: Some(UnitOfMeasure {
                    unit: "Wh".to_string(),
                    multiplier: 0,
                }),
            }],
        }],
    };
    serde_json::to_value(&request)
}
