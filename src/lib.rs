//! # OCPP 2.0.1 Charging Session Layer
//!
//! WebSocket central system and charge-point client for managing EV
//! charging stations over OCPP 2.0.1.
//!
//! ## Architecture
//!
//! - **shared**: wire framing and shutdown signalling
//! - **protocol**: action vocabulary and message payloads
//! - **session**: connection handles, pending calls, session registry
//! - **storage**: in-memory station and telemetry state
//! - **handlers**: inbound call handling for the central system
//! - **commands**: central-to-station command transport and dispatcher
//! - **server**: the WebSocket central system
//! - **client**: the charge-point side

pub mod client;
pub mod commands;
pub mod config;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod session;
pub mod shared;
pub mod storage;

pub use commands::{
    create_command_dispatcher, create_command_sender, CommandDispatcher, CommandError,
    CommandSender, SharedCommandDispatcher, SharedCommandSender,
};
pub use config::AppConfig;
pub use server::OcppServer;
pub use session::{SessionRegistry, SharedSessionRegistry};
pub use shared::shutdown::ShutdownSignal;
