//! In-memory station store
//!
//! Tracks every station ever seen by this process. Entries are created on the
//! first BootNotification and never removed: a disconnected station stays
//! listed with its last known boot metadata, only its status flips to
//! Inoperative.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;

/// Operational status of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationalStatus {
    Operative,
    Inoperative,
    Unknown,
}

impl OperationalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalStatus::Operative => "Operative",
            OperationalStatus::Inoperative => "Inoperative",
            OperationalStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata reported by the most recent BootNotification.
#[derive(Debug, Clone, Serialize)]
pub struct BootInfo {
    pub vendor: Option<String>,
    pub model: String,
    pub reason: String,
}

/// A known charging station.
#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub id: String,
    pub status: OperationalStatus,
    pub boot_info: Option<BootInfo>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub first_seen: DateTime<Utc>,
}

/// Thread-safe registry of known stations.
pub struct StationStore {
    stations: DashMap<String, Station>,
}

impl StationStore {
    pub fn new() -> Self {
        Self {
            stations: DashMap::new(),
        }
    }

    /// Upsert on BootNotification: a rebooting station is simply re-accepted.
    pub fn record_boot(&self, station_id: &str, boot_info: BootInfo) {
        let mut entry = self
            .stations
            .entry(station_id.to_string())
            .or_insert_with(|| Station {
                id: station_id.to_string(),
                status: OperationalStatus::Unknown,
                boot_info: None,
                last_heartbeat: None,
                first_seen: Utc::now(),
            });
        entry.status = OperationalStatus::Operative;
        entry.boot_info = Some(boot_info);
    }

    pub fn touch_heartbeat(&self, station_id: &str) {
        if let Some(mut station) = self.stations.get_mut(station_id) {
            station.last_heartbeat = Some(Utc::now());
        }
    }

    pub fn set_status(&self, station_id: &str, status: OperationalStatus) {
        if let Some(mut station) = self.stations.get_mut(station_id) {
            station.status = status;
        }
    }

    /// Session teardown forces the station Inoperative. The entry is kept.
    pub fn mark_disconnected(&self, station_id: &str) {
        self.set_status(station_id, OperationalStatus::Inoperative);
    }

    pub fn get(&self, station_id: &str) -> Option<Station> {
        self.stations.get(station_id).map(|s| s.clone())
    }

    /// All known stations, connected or not, ordered by id.
    pub fn list(&self) -> Vec<Station> {
        let mut stations: Vec<Station> =
            self.stations.iter().map(|e| e.value().clone()).collect();
        stations.sort_by(|a, b| a.id.cmp(&b.id));
        stations
    }

    pub fn count(&self) -> usize {
        self.stations.len()
    }
}

impl Default for StationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot_info() -> BootInfo {
        BootInfo {
            vendor: Some("Renesas Electronics".into()),
            model: "RZG2L".into(),
            reason: "PowerUp".into(),
        }
    }

    #[test]
    fn boot_creates_operative_station() {
        let store = StationStore::new();
        store.record_boot("CP_1", boot_info());

        let station = store.get("CP_1").unwrap();
        assert_eq!(station.status, OperationalStatus::Operative);
        assert_eq!(station.boot_info.unwrap().model, "RZG2L");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn reboot_reaccepts_inoperative_station() {
        let store = StationStore::new();
        store.record_boot("CP_1", boot_info());
        store.mark_disconnected("CP_1");
        assert_eq!(store.get("CP_1").unwrap().status, OperationalStatus::Inoperative);

        store.record_boot("CP_1", boot_info());
        assert_eq!(store.get("CP_1").unwrap().status, OperationalStatus::Operative);
    }

    #[test]
    fn disconnect_keeps_station_listed() {
        let store = StationStore::new();
        store.record_boot("CP_1", boot_info());
        store.mark_disconnected("CP_1");

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, OperationalStatus::Inoperative);
        assert!(listed[0].boot_info.is_some());
    }

    #[test]
    fn heartbeat_does_not_change_status_or_metadata() {
        let store = StationStore::new();
        store.record_boot("CP_1", boot_info());
        store.touch_heartbeat("CP_1");

        let station = store.get("CP_1").unwrap();
        assert!(station.last_heartbeat.is_some());
        assert_eq!(station.status, OperationalStatus::Operative);
        assert_eq!(station.boot_info.unwrap().reason, "PowerUp");
    }

    #[test]
    fn list_is_ordered_by_id() {
        let store = StationStore::new();
        store.record_boot("CP_2", boot_info());
        store.record_boot("CP_1", boot_info());
        let ids: Vec<String> = store.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["CP_1", "CP_2"]);
    }
}
