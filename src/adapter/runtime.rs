//! Adapter runtime integration.
//!
//! Bridges the sync event loop with the async TCP server. Commands flow in
//! through a bounded channel (overflow is a protocol error, not a stall);
//! replies and observations flow out through an unbounded channel.

use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::adapter::protocol::{AckMessage, ErrorMessage, ObservationMessage, PadDescriptor};
use crate::adapter::server::{run_server, ServerConfig, ServerState};
use crate::types::{PadId, PadOp};

/// Command delivered to the event loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

/// Command payload.
#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// Client asked for an immediate observation of both pads.
    SnapshotRequest,
    Command(ClientCommand),
}

/// Validated command from a controller client.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    Op { pad: PadId, op: PadOp },
    Unlock { code: String },
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Ack {
        client_id: usize,
        ack: AckMessage,
    },
    Error {
        client_id: usize,
        err: ErrorMessage,
    },
    Observation {
        client_id: usize,
        obs: ObservationMessage,
    },
    Broadcast {
        obs: ObservationMessage,
    },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns None if `TPAD_DISABLED` is set or the runtime cannot start.
    pub fn start_from_env(pads: [PadDescriptor; 2]) -> Option<Self> {
        if ServerState::is_disabled() {
            return None;
        }

        let config = ServerConfig::from_env();
        Self::start(config, pads)
    }

    /// Start the adapter with an explicit configuration.
    pub fn start(config: ServerConfig, pads: [PadDescriptor; 2]) -> Option<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new().ok()?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, pads, cmd_tx, out_rx, None).await {
                eprintln!("[Adapter] server stopped: {}", e);
            }
        });

        Some(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
        })
    }

    /// Non-blocking poll for the next pending command.
    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    /// Queue an outbound message for delivery.
    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }
}
