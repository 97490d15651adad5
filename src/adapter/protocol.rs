//! Protocol module - JSON message types for the remote control adapter
//!
//! Line-delimited JSON. All messages have: type, seq (strictly increasing
//! per sender), ts (timestamp in ms). Clients drive the pad with `command`
//! messages; the server answers with `ack`/`error` and streams
//! `observation` messages to interested clients.

use serde::{Deserialize, Serialize};

use crate::types::{PadId, Rotation};

/// Protocol version spoken by this server
pub const PROTOCOL_VERSION: &str = "1.0.0";

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(rename = "stream_observations")]
    pub stream_observations: bool,
}

/// Pad operation carried by a command message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandOp {
    Place,
    SetRotation,
    Undo,
    Redo,
    Reset,
    Unlock,
}

impl<'de> Deserialize<'de> for CommandOp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("place") {
            Ok(Self::Place)
        } else if s.eq_ignore_ascii_case("setRotation") {
            Ok(Self::SetRotation)
        } else if s.eq_ignore_ascii_case("undo") {
            Ok(Self::Undo)
        } else if s.eq_ignore_ascii_case("redo") {
            Ok(Self::Redo)
        } else if s.eq_ignore_ascii_case("reset") {
            Ok(Self::Reset)
        } else if s.eq_ignore_ascii_case("unlock") {
            Ok(Self::Unlock)
        } else {
            Err(serde::de::Error::custom("unknown op"))
        }
    }
}

impl Serialize for CommandOp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            CommandOp::Place => serializer.serialize_str("place"),
            CommandOp::SetRotation => serializer.serialize_str("setRotation"),
            CommandOp::Undo => serializer.serialize_str("undo"),
            CommandOp::Redo => serializer.serialize_str("redo"),
            CommandOp::Reset => serializer.serialize_str("reset"),
            CommandOp::Unlock => serializer.serialize_str("unlock"),
        }
    }
}

/// Pad selector on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PadName {
    #[serde(rename = "primary")]
    #[default]
    Primary,
    #[serde(rename = "vault")]
    Vault,
}

impl From<PadName> for PadId {
    fn from(value: PadName) -> Self {
        match value {
            PadName::Primary => PadId::Primary,
            PadName::Vault => PadId::Vault,
        }
    }
}

impl From<PadId> for PadName {
    fn from(value: PadId) -> Self {
        match value {
            PadId::Primary => PadName::Primary,
            PadId::Vault => PadName::Vault,
        }
    }
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub op: CommandOp,
    /// Target pad; defaults to the primary pad
    #[serde(default)]
    pub pad: PadName,
    pub row: Option<i8>,
    pub col: Option<i8>,
    /// Rotation degrees as a string, for op = setRotation
    pub rotation: Option<String>,
    /// Passcode entry, for op = unlock
    pub code: Option<String>,
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "pad_locked")]
    PadLocked,
    #[serde(rename = "bad_code")]
    BadCode,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    pub pads: [PadDescriptor; 2],
}

/// Describes one pad in the welcome handshake
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PadDescriptor {
    pub pad: PadName,
    pub size: u8,
    pub locked: bool,
}

/// Acknowledgment for a processed command.
///
/// `applied` carries the normal accepted/rejected outcome of an operation;
/// a rejected placement is an ack with applied = false, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    pub applied: bool,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Rotation degrees on the wire ("0", "90", "180", "270")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationName(pub Rotation);

impl Serialize for RotationName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for RotationName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        Rotation::from_str(s)
            .map(RotationName)
            .ok_or_else(|| serde::de::Error::custom("invalid rotation"))
    }
}

/// Board cells in an observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardCells {
    pub size: u8,
    /// Rows of cells, 0 = empty, 1 = occupied
    pub cells: Vec<Vec<u8>>,
}

/// Pad state observation (streamed to interested clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub pad: PadName,
    pub board: BoardCells,
    pub rotation: RotationName,
    #[serde(rename = "can_undo")]
    pub can_undo: bool,
    #[serde(rename = "can_redo")]
    pub can_redo: bool,
    pub cursor: u32,
    #[serde(rename = "history_len")]
    pub history_len: u32,
    pub revision: u32,
    #[serde(rename = "vault_locked")]
    pub vault_locked: bool,
    #[serde(rename = "state_hash")]
    pub state_hash: StateHash,
}

/// Deterministic state hash serialized as lowercase hex (without heap allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            let nib = (v & 0x0f) as usize;
            buf[15 - i] = HEX[nib];
            v >>= 4;
        }
        let s = std::str::from_utf8(&buf).expect("hex is valid utf8");
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        let s = s.trim();
        let mut v: u64 = 0;
        for b in s.as_bytes() {
            let d = match b {
                b'0'..=b'9' => (b - b'0') as u64,
                b'a'..=b'f' => (b - b'a' + 10) as u64,
                b'A'..=b'F' => (b - b'A' + 10) as u64,
                _ => return Err(serde::de::Error::custom("invalid hex")),
            };
            v = (v << 4) | d;
        }
        Ok(StateHash(v))
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if msg_type != "hello" && msg_type != "command" {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        requested: RequestedCapabilities {
            stream_observations: true,
        },
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    client_id: u64,
    role: AssignedRole,
    pads: [PadDescriptor; 2],
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        client_id,
        role,
        pads,
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, applied: bool) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        applied,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
