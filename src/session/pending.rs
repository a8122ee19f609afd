//! Pending-call bookkeeping
//!
//! Each session owns one [`PendingCalls`] map: outstanding outbound Calls
//! awaiting a correlated CallResult/CallError. Message ids are unique among
//! the session's outstanding calls; the central side draws them from a
//! counter, the client side uses UUIDs.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::commands::CommandError;

struct PendingCall {
    action: String,
    issued_at: DateTime<Utc>,
    reply_tx: oneshot::Sender<Result<Value, CommandError>>,
}

/// Outstanding calls of one session, keyed by message id.
pub struct PendingCalls {
    calls: DashMap<String, PendingCall>,
    message_counter: AtomicU64,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            message_counter: AtomicU64::new(1),
        }
    }

    /// Allocate a message id that is unique for this session. The counter is
    /// never reused, which keeps ids unique among outstanding calls.
    pub fn next_message_id(&self) -> String {
        let id = self.message_counter.fetch_add(1, Ordering::SeqCst);
        format!("CS-{}", id)
    }

    /// Track a new outbound call and hand back the receiver its reply will
    /// arrive on.
    pub fn register(
        &self,
        message_id: &str,
        action: &str,
    ) -> oneshot::Receiver<Result<Value, CommandError>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.calls.insert(
            message_id.to_string(),
            PendingCall {
                action: action.to_string(),
                issued_at: Utc::now(),
                reply_tx,
            },
        );
        reply_rx
    }

    /// Resolve a call with a success payload. Returns `false` when no call
    /// with that id is outstanding (e.g. the reply arrived after timeout).
    pub fn resolve(&self, message_id: &str, payload: Value) -> bool {
        match self.calls.remove(message_id) {
            Some((_, call)) => {
                let _ = call.reply_tx.send(Ok(payload));
                true
            }
            None => false,
        }
    }

    /// Resolve a call with the peer's CallError. Returns `false` for an
    /// unknown id.
    pub fn reject(&self, message_id: &str, code: &str, description: &str) -> bool {
        match self.calls.remove(message_id) {
            Some((_, call)) => {
                let _ = call.reply_tx.send(Err(CommandError::CallError {
                    code: code.to_string(),
                    description: description.to_string(),
                }));
                true
            }
            None => false,
        }
    }

    /// Drop a call without resolving it (timeout path).
    pub fn remove(&self, message_id: &str) -> bool {
        self.calls.remove(message_id).is_some()
    }

    /// Fail every outstanding call with the given error. Used on session
    /// teardown with [`CommandError::ConnectionLost`]. Idempotent.
    pub fn fail_all(&self, error: CommandError) {
        let ids: Vec<String> = self.calls.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, call)) = self.calls.remove(&id) {
                warn!(
                    message_id = id.as_str(),
                    action = call.action.as_str(),
                    age_ms = (Utc::now() - call.issued_at).num_milliseconds(),
                    "Failing outstanding call"
                );
                let _ = call.reply_tx.send(Err(error.clone()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn register_and_resolve() {
        let pending = PendingCalls::new();
        let id = pending.next_message_id();
        let rx = pending.register(&id, "Heartbeat");

        assert!(pending.resolve(&id, json!({"currentTime": "2025-01-01T00:00:00Z"})));
        let reply = rx.await.unwrap().unwrap();
        assert_eq!(reply["currentTime"], "2025-01-01T00:00:00Z");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn reject_delivers_call_error() {
        let pending = PendingCalls::new();
        let rx = pending.register("CS-1", "RequestStartTransaction");

        assert!(pending.reject("CS-1", "NotImplemented", "nope"));
        match rx.await.unwrap() {
            Err(CommandError::CallError { code, description }) => {
                assert_eq!(code, "NotImplemented");
                assert_eq!(description, "nope");
            }
            other => panic!("expected CallError, got {:?}", other),
        }
    }

    #[test]
    fn resolving_unknown_id_is_a_noop() {
        let pending = PendingCalls::new();
        assert!(!pending.resolve("CS-99", json!({})));
        assert!(!pending.reject("CS-99", "InternalError", ""));
        assert!(!pending.remove("CS-99"));
    }

    #[test]
    fn message_ids_are_unique() {
        let pending = PendingCalls::new();
        let a = pending.next_message_id();
        let b = pending.next_message_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn fail_all_delivers_connection_lost() {
        let pending = PendingCalls::new();
        let rx1 = pending.register("CS-1", "RequestStartTransaction");
        let rx2 = pending.register("CS-2", "SetChargingProfile");

        pending.fail_all(CommandError::ConnectionLost);
        assert!(pending.is_empty());
        assert!(matches!(rx1.await.unwrap(), Err(CommandError::ConnectionLost)));
        assert!(matches!(rx2.await.unwrap(), Err(CommandError::ConnectionLost)));

        // A second teardown must not panic.
        pending.fail_all(CommandError::ConnectionLost);
    }
}
