//! Adapter module - remote control protocol handling
//!
//! Exposes the pad operation surface to external clients over a
//! line-delimited JSON TCP protocol and streams pad observations back.

pub mod protocol;
pub mod runtime;
pub mod server;

pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{build_observation, run_server, ServerConfig, ServerState};
