//! In-memory state shared by all sessions: known stations and telemetry.

pub mod stations;
pub mod telemetry;

pub use stations::{BootInfo, OperationalStatus, Station, StationStore};
pub use telemetry::{MeterReading, SampledValue, TelemetryStore};
