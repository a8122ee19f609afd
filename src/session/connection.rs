//! Per-station connection handle
//!
//! A `Connection` is the session object registered for a station: the single
//! serialized writer to its socket, the pending calls it owns, and the close
//! signal used for eviction and supervisory shutdown. Frames handed to
//! [`Connection::send`] are drained by one send task per socket, so
//! concurrently produced frames never interleave mid-write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::session::pending::PendingCalls;
use crate::shared::shutdown::ShutdownSignal;

pub struct Connection {
    /// Distinguishes this connection from a later one for the same station,
    /// so a superseded session's teardown cannot unregister its successor.
    pub connection_id: u64,
    pub station_id: String,
    sender: mpsc::UnboundedSender<String>,
    pub pending: Arc<PendingCalls>,
    closer: ShutdownSignal,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(
        connection_id: u64,
        station_id: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            connection_id,
            station_id: station_id.into(),
            sender,
            pending: Arc::new(PendingCalls::new()),
            closer: ShutdownSignal::new(),
            connected_at: Utc::now(),
        }
    }

    /// Enqueue a frame for the session's send task.
    pub fn send(&self, frame: String) -> Result<(), String> {
        self.sender
            .send(frame)
            .map_err(|e| format!("connection writer closed: {}", e))
    }

    /// Ask the session to close. The read loop observes this and exits.
    pub fn close(&self) {
        self.closer.trigger();
    }

    pub fn is_closing(&self) -> bool {
        self.closer.is_triggered()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.closer.wait().await;
    }
}
