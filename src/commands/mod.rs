//! Central-to-station command transport
//!
//! [`CommandSender`] is the low-level transport: it sends raw
//! `[2, id, action, payload]` frames through a session's serialized writer
//! and suspends the caller on a oneshot until the session's read loop
//! resolves the pending call, the peer answers with a CallError, or the
//! deadline elapses. [`CommandDispatcher`] is the typed facade layered on
//! top for the control surface.

pub mod dispatcher;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::protocol::Action;
use crate::session::registry::SharedSessionRegistry;
use crate::shared::frame::OcppFrame;

pub use dispatcher::{create_command_dispatcher, CommandDispatcher, SharedCommandDispatcher};

/// Errors surfaced to a command's caller. Always typed results, never
/// unhandled failures.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("station {0} is not connected")]
    StationNotConnected(String),

    #[error("failed to send: {0}")]
    SendFailed(String),

    #[error("no reply within the deadline")]
    Timeout,

    #[error("session closed while the call was outstanding")]
    ConnectionLost,

    #[error("invalid reply: {0}")]
    InvalidResponse(String),

    #[error("CallError {code}: {description}")]
    CallError { code: String, description: String },
}

/// Sends commands to connected stations and correlates their replies.
pub struct CommandSender {
    registry: SharedSessionRegistry,
}

impl CommandSender {
    pub fn new(registry: SharedSessionRegistry) -> Self {
        Self { registry }
    }

    /// Send a Call to a station and wait for the correlated reply.
    ///
    /// Suspends only the calling context: the session's read loop and other
    /// stations' dispatch continue unaffected. The pending entry is removed
    /// on every exit path, so repeated timeouts do not leak.
    pub async fn send_command(
        &self,
        station_id: &str,
        action: Action,
        payload: Value,
        deadline: Duration,
    ) -> Result<Value, CommandError> {
        let connection = self
            .registry
            .lookup(station_id)
            .ok_or_else(|| CommandError::StationNotConnected(station_id.to_string()))?;

        let message_id = connection.pending.next_message_id();
        let frame = OcppFrame::Call {
            message_id: message_id.clone(),
            action: action.as_str().to_string(),
            payload,
        };

        let reply_rx = connection.pending.register(&message_id, action.as_str());

        info!(
            station_id,
            %action,
            message_id = message_id.as_str(),
            "Sending command"
        );

        if let Err(e) = connection.send(frame.serialize()) {
            connection.pending.remove(&message_id);
            return Err(CommandError::SendFailed(e));
        }

        match timeout(deadline, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                // Reply sender dropped without resolving: the session tore
                // down between send and reply.
                connection.pending.remove(&message_id);
                Err(CommandError::ConnectionLost)
            }
            Err(_) => {
                connection.pending.remove(&message_id);
                warn!(
                    station_id,
                    %action,
                    message_id = message_id.as_str(),
                    "Command timed out"
                );
                Err(CommandError::Timeout)
            }
        }
    }

    pub fn registry(&self) -> &SharedSessionRegistry {
        &self.registry
    }
}

pub type SharedCommandSender = Arc<CommandSender>;

pub fn create_command_sender(registry: SharedSessionRegistry) -> SharedCommandSender {
    Arc::new(CommandSender::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRegistry;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn sender_with_registry() -> (CommandSender, SharedSessionRegistry) {
        let registry = SessionRegistry::shared();
        (CommandSender::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn unknown_station_is_rejected() {
        let (sender, _registry) = sender_with_registry();
        let result = sender
            .send_command("CP_404", Action::Heartbeat, json!({}), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(CommandError::StationNotConnected(id)) if id == "CP_404"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_exactly_at_deadline_and_removes_pending() {
        let (sender, registry) = sender_with_registry();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = registry.register("CP_1", tx);

        let start = Instant::now();
        let result = sender
            .send_command(
                "CP_1",
                Action::RequestStartTransaction,
                json!({"evseId": 1}),
                Duration::from_secs(5),
            )
            .await;

        assert!(matches!(result, Err(CommandError::Timeout)));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert!(connection.pending.is_empty(), "timed-out call must not leak");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_timeouts_do_not_leak() {
        let (sender, registry) = sender_with_registry();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = registry.register("CP_1", tx);

        for _ in 0..10 {
            let _ = sender
                .send_command("CP_1", Action::Heartbeat, json!({}), Duration::from_millis(50))
                .await;
        }
        assert!(connection.pending.is_empty());
    }

    #[tokio::test]
    async fn reply_resolves_the_caller() {
        let (sender, registry) = sender_with_registry();
        let (tx, mut frame_rx) = mpsc::unbounded_channel();
        let connection = registry.register("CP_1", tx);

        let pending = connection.pending.clone();
        tokio::spawn(async move {
            let frame = frame_rx.recv().await.expect("frame should be sent");
            let parsed = OcppFrame::parse(&frame).unwrap();
            match parsed {
                OcppFrame::Call { message_id, action, .. } => {
                    assert_eq!(action, "RequestStartTransaction");
                    pending.resolve(&message_id, json!({"status": "Accepted"}));
                }
                other => panic!("expected Call, got {:?}", other),
            }
        });

        let reply = sender
            .send_command(
                "CP_1",
                Action::RequestStartTransaction,
                json!({"evseId": 1}),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(reply["status"], "Accepted");
        assert!(connection.pending.is_empty());
    }

    #[tokio::test]
    async fn call_error_reply_is_typed() {
        let (sender, registry) = sender_with_registry();
        let (tx, mut frame_rx) = mpsc::unbounded_channel();
        let connection = registry.register("CP_1", tx);

        let pending = connection.pending.clone();
        tokio::spawn(async move {
            let frame = frame_rx.recv().await.unwrap();
            let parsed = OcppFrame::parse(&frame).unwrap();
            pending.reject(parsed.message_id(), "NotImplemented", "unsupported");
        });

        let result = sender
            .send_command("CP_1", Action::SetChargingProfile, json!({}), Duration::from_secs(5))
            .await;
        match result {
            Err(CommandError::CallError { code, description }) => {
                assert_eq!(code, "NotImplemented");
                assert_eq!(description, "unsupported");
            }
            other => panic!("expected CallError, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_station_does_not_delay_another() {
        let (sender, registry) = sender_with_registry();
        let sender = Arc::new(sender);

        // CP_SLOW never replies; CP_FAST replies immediately.
        let (slow_tx, _slow_rx) = mpsc::unbounded_channel();
        registry.register("CP_SLOW", slow_tx);
        let (fast_tx, mut fast_rx) = mpsc::unbounded_channel();
        let fast = registry.register("CP_FAST", fast_tx);

        let slow_call = {
            let sender = sender.clone();
            tokio::spawn(async move {
                sender
                    .send_command("CP_SLOW", Action::Heartbeat, json!({}), Duration::from_secs(30))
                    .await
            })
        };

        let fast_pending = fast.pending.clone();
        tokio::spawn(async move {
            let frame = fast_rx.recv().await.unwrap();
            let parsed = OcppFrame::parse(&frame).unwrap();
            fast_pending.resolve(parsed.message_id(), json!({"status": "Accepted"}));
        });

        let start = Instant::now();
        let fast_reply = sender
            .send_command("CP_FAST", Action::RequestStopTransaction, json!({}), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(fast_reply["status"], "Accepted");
        // The fast call completed without waiting out the slow one's deadline.
        assert!(start.elapsed() < Duration::from_secs(30));
        assert!(!slow_call.is_finished());

        let slow_result = slow_call.await.unwrap();
        assert!(matches!(slow_result, Err(CommandError::Timeout)));
    }

    #[tokio::test]
    async fn session_teardown_fails_outstanding_call() {
        let (sender, registry) = sender_with_registry();
        let (tx, mut frame_rx) = mpsc::unbounded_channel();
        let connection = registry.register("CP_1", tx);

        let pending = connection.pending.clone();
        tokio::spawn(async move {
            let _frame = frame_rx.recv().await.unwrap();
            pending.fail_all(CommandError::ConnectionLost);
        });

        let result = sender
            .send_command("CP_1", Action::ChangeAvailability, json!({}), Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(CommandError::ConnectionLost)));
    }
}
