//! OCPP 2.0.1 charge-point client
//!
//! Simulated charging station that connects to a central system, boots,
//! heartbeats at the server-assigned interval, answers central-initiated
//! commands, and streams meter values while a transaction is active.
//!
//! Reconnects forever with a fixed delay; each attempt is a fresh session
//! with its own pending-call table, so a reply from a dead connection can
//! never resolve a call made on the next one.

pub mod metering;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::commands::CommandError;
use crate::protocol::{
    Action, BootNotificationRequest, BootNotificationResponse, ChargingStation, ErrorCode,
};
use crate::server::OCPP_SUBPROTOCOL;
use crate::session::PendingCalls;
use crate::shared::frame::OcppFrame;
use crate::shared::shutdown::ShutdownSignal;

use metering::{EnergyRegister, MeterTask};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

#[derive(Debug, Clone)]
pub struct ChargePointConfig {
    /// Central system base URL, e.g. `ws://127.0.0.1:9000`
    pub server_url: String,
    /// Station identity, appended to the URL path
    pub station_id: String,
    pub model: String,
    pub vendor: String,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// How long a station-initiated call waits for its reply
    pub call_timeout: Duration,
    /// Period between meter samples during a transaction
    pub metering_interval: Duration,
}

impl Default for ChargePointConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:9000".to_string(),
            station_id: "CP_1".to_string(),
            model: "RZG2L".to_string(),
            vendor: "Renesas Electronics".to_string(),
            reconnect_delay: Duration::from_secs(5),
            call_timeout: Duration::from_secs(30),
            metering_interval: Duration::from_secs(5),
        }
    }
}

/// Station-side call transport: serialized writer plus this connection's
/// pending-call table. Cheap to clone, one per connection.
#[derive(Clone)]
pub(crate) struct CallLink {
    station_id: String,
    sender: mpsc::UnboundedSender<String>,
    pending: Arc<PendingCalls>,
    call_timeout: Duration,
}

impl CallLink {
    /// Send a Call and wait for the correlated reply.
    pub(crate) async fn call(&self, action: Action, payload: Value) -> Result<Value, CommandError> {
        let message_id = Uuid::new_v4().to_string();
        let reply_rx = self.pending.register(&message_id, action.as_str());
        let frame = OcppFrame::Call {
            message_id: message_id.clone(),
            action: action.as_str().to_string(),
            payload,
        };

        if self.sender.send(frame.serialize()).is_err() {
            self.pending.remove(&message_id);
            return Err(CommandError::SendFailed("connection writer closed".into()));
        }

        match timeout(self.call_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.remove(&message_id);
                Err(CommandError::ConnectionLost)
            }
            Err(_) => {
                self.pending.remove(&message_id);
                warn!(
                    station_id = self.station_id.as_str(),
                    %action,
                    "Call timed out"
                );
                Err(CommandError::Timeout)
            }
        }
    }

    /// Fire-and-forget write, used for replies to the central system.
    fn reply(&self, frame: String) {
        if self.sender.send(frame).is_err() {
            warn!(
                station_id = self.station_id.as_str(),
                "Dropping reply, connection writer closed"
            );
        }
    }
}

pub struct ChargePoint {
    config: ChargePointConfig,
    shutdown: ShutdownSignal,
    /// Cumulative energy register, carried across transactions and
    /// reconnects for the lifetime of the station.
    energy: EnergyRegister,
}

impl ChargePoint {
    pub fn new(config: ChargePointConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            config,
            shutdown,
            energy: EnergyRegister::new(),
        }
    }

    /// Connect and serve until shutdown, reconnecting on every failure.
    pub async fn run(&self) {
        let url = build_station_url(&self.config.server_url, &self.config.station_id);
        loop {
            if self.shutdown.is_triggered() {
                return;
            }
            info!(url = url.as_str(), "Connecting to central system");
            match self.connect_and_run(&url).await {
                Ok(()) => info!("Connection closed"),
                Err(e) => warn!("Connection failed: {}", e),
            }
            if self.shutdown.is_triggered() {
                return;
            }
            info!("Reconnecting in {:?}", self.config.reconnect_delay);
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = self.shutdown.wait() => return,
            }
        }
    }

    async fn connect_and_run(&self, url: &str) -> Result<(), ClientError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        request.headers_mut().insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(OCPP_SUBPROTOCOL),
        );

        let (ws_stream, response) = tokio_tungstenite::connect_async(request).await?;

        let accepted = response
            .headers()
            .get(header::SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok());
        if accepted != Some(OCPP_SUBPROTOCOL) {
            warn!(
                "Central system did not accept {} subprotocol, got: {:?}",
                OCPP_SUBPROTOCOL, accepted
            );
        }
        info!(station_id = self.config.station_id.as_str(), "Connected");

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let link = CallLink {
            station_id: self.config.station_id.clone(),
            sender: tx,
            pending: Arc::new(PendingCalls::new()),
            call_timeout: self.config.call_timeout,
        };

        // Single writer per socket.
        let send_station_id = self.config.station_id.clone();
        let send_task = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                debug!(station_id = send_station_id.as_str(), frame = frame.as_str(), "->");
                if ws_sender.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        });

        // Connection-scoped cancellation for the boot/heartbeat and meter
        // tasks; they must not outlive this socket.
        let link_down = ShutdownSignal::new();
        let mut handler = StationHandler::new(
            link.clone(),
            self.config.metering_interval,
            self.energy.clone(),
        );

        let boot_task = tokio::spawn(boot_and_heartbeat(
            link.clone(),
            self.config.model.clone(),
            self.config.vendor.clone(),
            link_down.clone(),
        ));

        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            debug!(
                                station_id = self.config.station_id.as_str(),
                                frame = text.as_str(),
                                "<-"
                            );
                            handler.handle(&text).await;
                        }
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) => {
                            info!("Central system closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("WebSocket error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
                _ = self.shutdown.wait() => {
                    info!("Charge point shutting down");
                    break;
                }
            }
        }

        link_down.trigger();
        handler.stop_metering().await;
        boot_task.abort();
        link.pending.fail_all(CommandError::ConnectionLost);
        send_task.abort();
        Ok(())
    }
}

/// Send BootNotification, then heartbeat at the interval the central system
/// assigned in its response.
async fn boot_and_heartbeat(
    link: CallLink,
    model: String,
    vendor: String,
    link_down: ShutdownSignal,
) {
    let boot = BootNotificationRequest {
        charging_station: ChargingStation {
            model,
            vendor_name: Some(vendor),
        },
        reason: "PowerUp".to_string(),
    };
    let payload = match serde_json::to_value(&boot) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to encode BootNotification: {}", e);
            return;
        }
    };

    let response = match link.call(Action::BootNotification, payload).await {
        Ok(value) => match serde_json::from_value::<BootNotificationResponse>(value) {
            Ok(r) => r,
            Err(e) => {
                warn!("Unparseable BootNotification response: {}", e);
                return;
            }
        },
        Err(e) => {
            warn!("BootNotification failed: {}", e);
            return;
        }
    };

    if response.status != "Accepted" {
        warn!("BootNotification rejected with status: {}", response.status);
        return;
    }
    info!(interval = response.interval, "BootNotification accepted");

    let interval = Duration::from_secs(u64::from(response.interval.max(1)));
    loop {
        if let Err(e) = link.call(Action::Heartbeat, json!({})).await {
            warn!("Heartbeat failed: {}", e);
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = link_down.wait() => return,
        }
    }
}

/// Handles central-initiated calls and reply frames on one connection.
struct StationHandler {
    link: CallLink,
    metering_interval: Duration,
    energy: EnergyRegister,
    meter_task: Option<MeterTask>,
}

impl StationHandler {
    fn new(link: CallLink, metering_interval: Duration, energy: EnergyRegister) -> Self {
        Self {
            link,
            metering_interval,
            energy,
            meter_task: None,
        }
    }

    async fn handle(&mut self, text: &str) {
        match OcppFrame::parse(text) {
            Ok(OcppFrame::Call {
                message_id,
                action,
                payload,
            }) => self.handle_call(&message_id, &action, payload).await,
            Ok(OcppFrame::CallResult {
                message_id,
                payload,
            }) => {
                if !self.link.pending.resolve(&message_id, payload) {
                    warn!(
                        message_id = message_id.as_str(),
                        "CallResult for unknown message id, dropping"
                    );
                }
            }
            Ok(OcppFrame::CallError {
                message_id,
                error_code,
                error_description,
                ..
            }) => {
                if !self
                    .link
                    .pending
                    .reject(&message_id, &error_code, &error_description)
                {
                    warn!(
                        message_id = message_id.as_str(),
                        "CallError for unknown message id, dropping"
                    );
                }
            }
            Err(e) => warn!("Dropping undecodable frame: {}", e),
        }
    }

    async fn handle_call(&mut self, message_id: &str, action: &str, payload: Value) {
        info!(action, message_id, "Command from central system");
        let result = match action.parse::<Action>() {
            Ok(Action::RequestStartTransaction) => self.on_request_start(&payload),
            Ok(Action::RequestStopTransaction) => self.on_request_stop(&payload).await,
            Ok(Action::ChangeAvailability) => self.on_change_availability(&payload),
            Ok(Action::SetChargingProfile) => self.on_set_charging_profile(&payload),
            _ => Err((
                ErrorCode::NotImplemented,
                format!("{} is not handled by this station", action),
            )),
        };

        let frame = match result {
            Ok(reply) => OcppFrame::CallResult {
                message_id: message_id.to_string(),
                payload: reply,
            },
            Err((code, description)) => {
                warn!(
                    action,
                    code = code.as_str(),
                    description = description.as_str(),
                    "Rejecting command"
                );
                OcppFrame::error_response(message_id.to_string(), code.as_str(), description)
            }
        };
        self.link.reply(frame.serialize());
    }

    fn on_request_start(&mut self, payload: &Value) -> CallOutcome {
        let id_token = payload
            .get("idToken")
            .and_then(|t| t.get("idToken"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                (
                    ErrorCode::FormatViolation,
                    "idToken missing".to_string(),
                )
            })?;
        let evse_id = match payload.get("evseId") {
            None => 1,
            Some(raw) => raw
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .ok_or_else(|| {
                    (
                        ErrorCode::FormatViolation,
                        "evseId out of range".to_string(),
                    )
                })?,
        };
        info!(id_token, evse_id, "Remote start transaction");

        if self.meter_task.as_ref().map_or(true, |t| t.is_finished()) {
            self.meter_task = Some(MeterTask::spawn(
                self.link.clone(),
                evse_id,
                self.metering_interval,
                self.energy.clone(),
            ));
        }
        Ok(json!({"status": "Accepted"}))
    }

    async fn on_request_stop(&mut self, payload: &Value) -> CallOutcome {
        let transaction_id = payload
            .get("transactionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                (
                    ErrorCode::FormatViolation,
                    "transactionId missing".to_string(),
                )
            })?;
        info!(transaction_id, "Remote stop transaction");
        self.stop_metering().await;
        Ok(json!({"status": "Accepted"}))
    }

    fn on_change_availability(&self, payload: &Value) -> CallOutcome {
        let status = payload
            .get("operationalStatus")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                (
                    ErrorCode::FormatViolation,
                    "operationalStatus missing".to_string(),
                )
            })?;
        info!(status, "Change availability");
        Ok(json!({"status": "Accepted"}))
    }

    fn on_set_charging_profile(&self, payload: &Value) -> CallOutcome {
        if !payload
            .get("chargingProfile")
            .map_or(false, Value::is_object)
        {
            return Err((
                ErrorCode::FormatViolation,
                "chargingProfile missing".to_string(),
            ));
        }
        info!("Set charging profile");
        Ok(json!({"status": "Accepted"}))
    }

    async fn stop_metering(&mut self) {
        if let Some(task) = self.meter_task.take() {
            task.stop().await;
        }
    }
}

type CallOutcome = Result<Value, (ErrorCode, String)>;

fn build_station_url(base_url: &str, station_id: &str) -> String {
    format!("{}/ocpp/{}", base_url.trim_end_matches('/'), station_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> (CallLink, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            CallLink {
                station_id: "CP_1".to_string(),
                sender: tx,
                pending: Arc::new(PendingCalls::new()),
                call_timeout: Duration::from_secs(30),
            },
            rx,
        )
    }

    fn sent_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> OcppFrame {
        OcppFrame::parse(&rx.try_recv().expect("expected a frame")).unwrap()
    }

    async fn next_meter_value(rx: &mut mpsc::UnboundedReceiver<String>) -> f64 {
        loop {
            let frame = rx.recv().await.expect("writer closed");
            if let Ok(OcppFrame::Call { action, payload, .. }) = OcppFrame::parse(&frame) {
                if action == "MeterValues" {
                    return payload["meterValue"][0]["sampledValue"][0]["value"]
                        .as_f64()
                        .unwrap();
                }
            }
        }
    }

    #[test]
    fn station_url_building() {
        assert_eq!(
            build_station_url("ws://127.0.0.1:9000", "CP_1"),
            "ws://127.0.0.1:9000/ocpp/CP_1"
        );
        assert_eq!(
            build_station_url("ws://127.0.0.1:9000/", "CP_1"),
            "ws://127.0.0.1:9000/ocpp/CP_1"
        );
    }

    #[tokio::test]
    async fn request_start_is_accepted_and_starts_metering() {
        let (link, mut rx) = link();
        let mut handler = StationHandler::new(link, Duration::from_secs(5), EnergyRegister::new());

        let frame = json!([2, "CS-1", "RequestStartTransaction", {
            "idToken": {"idToken": "TEST1234", "type": "ISO14443"},
            "evseId": 1
        }]);
        handler.handle(&frame.to_string()).await;

        match sent_frame(&mut rx) {
            OcppFrame::CallResult { message_id, payload } => {
                assert_eq!(message_id, "CS-1");
                assert_eq!(payload["status"], "Accepted");
            }
            other => panic!("expected CallResult, got {:?}", other),
        }
        assert!(handler.meter_task.is_some());
        handler.stop_metering().await;
    }

    #[tokio::test]
    async fn request_start_without_token_is_rejected() {
        let (link, mut rx) = link();
        let mut handler = StationHandler::new(link, Duration::from_secs(5), EnergyRegister::new());

        let frame = json!([2, "CS-1", "RequestStartTransaction", {"evseId": 1}]);
        handler.handle(&frame.to_string()).await;

        match sent_frame(&mut rx) {
            OcppFrame::CallError { error_code, .. } => {
                assert_eq!(error_code, "FormatViolation");
            }
            other => panic!("expected CallError, got {:?}", other),
        }
        assert!(handler.meter_task.is_none());
    }

    #[tokio::test]
    async fn request_stop_cancels_metering() {
        let (link, mut rx) = link();
        let mut handler = StationHandler::new(link, Duration::from_secs(5), EnergyRegister::new());

        let start = json!([2, "CS-1", "RequestStartTransaction", {
            "idToken": {"idToken": "TEST1234", "type": "ISO14443"},
            "evseId": 1
        }]);
        handler.handle(&start.to_string()).await;
        let _ = sent_frame(&mut rx);

        let stop = json!([2, "CS-2", "RequestStopTransaction", {"transactionId": "tx-1"}]);
        handler.handle(&stop.to_string()).await;

        // Drain frames until we see the stop acknowledgment; a first meter
        // sample may already be queued.
        loop {
            match sent_frame(&mut rx) {
                OcppFrame::CallResult { message_id, payload } if message_id == "CS-2" => {
                    assert_eq!(payload["status"], "Accepted");
                    break;
                }
                _ => continue,
            }
        }
        assert!(handler.meter_task.is_none());
    }

    #[tokio::test]
    async fn energy_register_is_cumulative_across_transactions() {
        let (link, mut rx) = link();
        let mut handler =
            StationHandler::new(link, Duration::from_secs(60), EnergyRegister::new());

        let start = json!([2, "CS-1", "RequestStartTransaction", {
            "idToken": {"idToken": "TEST1234", "type": "ISO14443"},
            "evseId": 1
        }]);
        handler.handle(&start.to_string()).await;
        assert_eq!(next_meter_value(&mut rx).await, 1100.0);

        let stop = json!([2, "CS-2", "RequestStopTransaction", {"transactionId": "tx-1"}]);
        handler.handle(&stop.to_string()).await;

        // A register never regresses: the second transaction continues from
        // where the first one stopped.
        let start = json!([2, "CS-3", "RequestStartTransaction", {
            "idToken": {"idToken": "TEST1234", "type": "ISO14443"},
            "evseId": 1
        }]);
        handler.handle(&start.to_string()).await;
        assert_eq!(next_meter_value(&mut rx).await, 1200.0);
        handler.stop_metering().await;
    }

    #[tokio::test]
    async fn oversized_evse_id_is_rejected() {
        let (link, mut rx) = link();
        let mut handler =
            StationHandler::new(link, Duration::from_secs(5), EnergyRegister::new());

        let frame = json!([2, "CS-1", "RequestStartTransaction", {
            "idToken": {"idToken": "TEST1234", "type": "ISO14443"},
            "evseId": u64::from(u32::MAX) + 1
        }]);
        handler.handle(&frame.to_string()).await;
        match sent_frame(&mut rx) {
            OcppFrame::CallError { error_code, .. } => {
                assert_eq!(error_code, "FormatViolation");
            }
            other => panic!("expected CallError, got {:?}", other),
        }
        assert!(handler.meter_task.is_none());
    }

    #[tokio::test]
    async fn change_availability_and_profile_are_acknowledged() {
        let (link, mut rx) = link();
        let mut handler = StationHandler::new(link, Duration::from_secs(5), EnergyRegister::new());

        let frame = json!([2, "CS-1", "ChangeAvailability", {
            "operationalStatus": "Inoperative",
            "evse": {"id": 1}
        }]);
        handler.handle(&frame.to_string()).await;
        match sent_frame(&mut rx) {
            OcppFrame::CallResult { payload, .. } => assert_eq!(payload["status"], "Accepted"),
            other => panic!("expected CallResult, got {:?}", other),
        }

        let frame = json!([2, "CS-2", "SetChargingProfile", {
            "evseId": 1,
            "chargingProfile": {"id": 1}
        }]);
        handler.handle(&frame.to_string()).await;
        match sent_frame(&mut rx) {
            OcppFrame::CallResult { payload, .. } => assert_eq!(payload["status"], "Accepted"),
            other => panic!("expected CallResult, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_command_is_not_implemented() {
        let (link, mut rx) = link();
        let mut handler = StationHandler::new(link, Duration::from_secs(5), EnergyRegister::new());

        handler
            .handle(&json!([2, "CS-1", "Reset", {}]).to_string())
            .await;
        match sent_frame(&mut rx) {
            OcppFrame::CallError { error_code, .. } => {
                assert_eq!(error_code, "NotImplemented");
            }
            other => panic!("expected CallError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn full_charging_session_over_loopback() {
        use crate::commands::{create_command_dispatcher, create_command_sender};
        use crate::config::AppConfig;
        use crate::server::OcppServer;
        use crate::storage::OperationalStatus;
        use tokio::net::TcpListener;

        async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
            tokio::time::timeout(Duration::from_secs(5), async {
                while !cond() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", what));
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_shutdown = ShutdownSignal::new();
        let server = Arc::new(OcppServer::new(AppConfig::default(), server_shutdown.clone()));
        let serve = server.clone();
        tokio::spawn(async move { serve.serve(listener).await });

        let client_shutdown = ShutdownSignal::new();
        let charge_point = ChargePoint::new(
            ChargePointConfig {
                server_url: format!("ws://{}", addr),
                metering_interval: Duration::from_millis(50),
                ..ChargePointConfig::default()
            },
            client_shutdown.clone(),
        );
        tokio::spawn(async move { charge_point.run().await });

        // Boot completes and registers the station.
        let stations = server.stations();
        wait_for("boot", || {
            stations
                .get("CP_1")
                .map_or(false, |s| s.status == OperationalStatus::Operative)
        })
        .await;

        let dispatcher = create_command_dispatcher(
            create_command_sender(server.registry()),
            server.stations(),
            Duration::from_secs(5),
        );

        let status = dispatcher
            .request_start_transaction("CP_1", "TEST1234", 1)
            .await
            .unwrap();
        assert_eq!(status, "Accepted");

        // Meter values arrive with a strictly increasing energy counter.
        let telemetry = server.telemetry();
        wait_for("meter values", || telemetry.count("CP_1") >= 3).await;
        let values: Vec<f64> = telemetry
            .history("CP_1")
            .iter()
            .map(|r| r.sampled_values[0].value.parse::<f64>().unwrap())
            .collect();
        assert_eq!(values[0], 1100.0);
        assert!(values.windows(2).all(|w| w[1] > w[0]));

        // Stop halts the stream: the station cancels its task before
        // acknowledging, and frames are processed in order, so once the
        // reply is in no further readings can land.
        let status = dispatcher
            .request_stop_transaction("CP_1", "1")
            .await
            .unwrap();
        assert_eq!(status, "Accepted");
        let count_at_stop = telemetry.count("CP_1");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(telemetry.count("CP_1"), count_at_stop);

        client_shutdown.trigger();
        server_shutdown.trigger();
    }

    #[tokio::test]
    async fn call_result_resolves_pending_on_the_link() {
        let (link, _rx) = link();
        let mut handler =
            StationHandler::new(link.clone(), Duration::from_secs(5), EnergyRegister::new());
        let reply_rx = link.pending.register("b1", "BootNotification");

        handler
            .handle(&json!([3, "b1", {"status": "Accepted", "interval": 10}]).to_string())
            .await;
        let value = reply_rx.await.unwrap().unwrap();
        assert_eq!(value["status"], "Accepted");
    }
}
