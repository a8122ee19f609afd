//! Cross-cutting support: wire framing and shutdown signalling.

pub mod frame;
pub mod shutdown;
