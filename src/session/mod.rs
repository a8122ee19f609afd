//! Protocol session management: connection handles, pending-call
//! bookkeeping and the process-wide registry.

pub mod connection;
pub mod pending;
pub mod registry;

pub use connection::Connection;
pub use pending::PendingCalls;
pub use registry::{SessionRegistry, SharedSessionRegistry};
