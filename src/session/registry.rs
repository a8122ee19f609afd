//! Session registry
//!
//! Process-wide map from station id to its active session. DashMap sharding
//! gives per-id exclusivity without serializing unrelated stations against
//! each other.
//!
//! Reconnect policy is close-then-replace: registering over a live session
//! closes the old one and fails its pending calls with `ConnectionLost`
//! before the new session is installed, so no two sockets ever both believe
//! they own a station id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::CommandError;
use crate::session::connection::Connection;

pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Connection>>,
    connection_counter: AtomicU64,
}

/// Shared, reference-counted session registry.
pub type SharedSessionRegistry = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            connection_counter: AtomicU64::new(1),
        }
    }

    /// Wrap in `Arc` for shared ownership.
    pub fn shared() -> SharedSessionRegistry {
        Arc::new(Self::new())
    }

    /// Install a new session for a station, evicting any live one first.
    pub fn register(
        &self,
        station_id: &str,
        sender: mpsc::UnboundedSender<String>,
    ) -> Arc<Connection> {
        let connection_id = self.connection_counter.fetch_add(1, Ordering::SeqCst);
        let connection = Arc::new(Connection::new(connection_id, station_id, sender));

        if let Some(evicted) = self
            .sessions
            .insert(station_id.to_string(), connection.clone())
        {
            warn!(
                station_id,
                evicted_connection = evicted.connection_id,
                connection = connection_id,
                "Station reconnected, closing previous session"
            );
            evicted.close();
            evicted.pending.fail_all(CommandError::ConnectionLost);
        } else {
            info!(station_id, connection = connection_id, "Registered session");
        }

        connection
    }

    pub fn lookup(&self, station_id: &str) -> Option<Arc<Connection>> {
        self.sessions.get(station_id).map(|e| e.value().clone())
    }

    /// Remove a session, but only if the entry still belongs to the given
    /// connection. Returns `true` when the entry was removed, i.e. the caller
    /// owned the active session and should mark the station Inoperative. A
    /// superseded session's late unregister returns `false`.
    pub fn unregister(&self, station_id: &str, connection_id: u64) -> bool {
        let removed = self
            .sessions
            .remove_if(station_id, |_, conn| conn.connection_id == connection_id)
            .is_some();
        if removed {
            info!(station_id, connection = connection_id, "Unregistered session");
        } else {
            warn!(
                station_id,
                connection = connection_id,
                "Skipped unregister, session already replaced or gone"
            );
        }
        removed
    }

    pub fn is_connected(&self, station_id: &str) -> bool {
        self.sessions.contains_key(station_id)
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Ask every live session to close. Used for graceful shutdown; the read
    /// loops do the actual unregistering.
    pub fn close_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().close();
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
