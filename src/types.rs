//! Core types shared across the application
//! This module contains pure data types with no external dependencies

/// Pad side length bounds (cells per side)
pub const MIN_PAD_SIZE: u8 = 6;
pub const MAX_PAD_SIZE: u8 = 8;

/// Default side length for the primary pad
pub const DEFAULT_PAD_SIZE: u8 = 8;

/// Side length for the passcode-gated vault pad
pub const VAULT_PAD_SIZE: u8 = 6;

/// Number of cells occupied by one placed shape
pub const SHAPE_CELLS: usize = 4;

/// Hardcoded vault passcode (4 numeric characters)
pub const GATE_PASSCODE: &str = "2846";

/// Event loop tick (milliseconds)
pub const TICK_MS: u32 = 16;

/// Placement cursor key repeat timing (milliseconds)
pub const CURSOR_DAS_MS: u32 = 180;
pub const CURSOR_ARR_MS: u32 = 60;

/// Rotation of the placed shape, in degrees clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// All rotations in clockwise order
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// Step clockwise
    pub fn cw(&self) -> Self {
        match self {
            Rotation::R0 => Rotation::R90,
            Rotation::R90 => Rotation::R180,
            Rotation::R180 => Rotation::R270,
            Rotation::R270 => Rotation::R0,
        }
    }

    /// Step counter-clockwise
    pub fn ccw(&self) -> Self {
        match self {
            Rotation::R0 => Rotation::R270,
            Rotation::R270 => Rotation::R180,
            Rotation::R180 => Rotation::R90,
            Rotation::R90 => Rotation::R0,
        }
    }

    /// Parse from a degree string (wire format)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "0" => Some(Rotation::R0),
            "90" => Some(Rotation::R90),
            "180" => Some(Rotation::R180),
            "270" => Some(Rotation::R270),
            _ => None,
        }
    }

    /// Degree string (wire format)
    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::R0 => "0",
            Rotation::R90 => "90",
            Rotation::R180 => "180",
            Rotation::R270 => "270",
        }
    }

    /// Numeric degrees (for display)
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }
}

/// Cell on the board (false = empty, true = occupied)
pub type Cell = bool;

/// Identifies one of the two pads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadId {
    Primary,
    Vault,
}

impl PadId {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Some(PadId::Primary),
            "vault" => Some(PadId::Vault),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PadId::Primary => "primary",
            PadId::Vault => "vault",
        }
    }

    /// The other pad
    pub fn other(&self) -> Self {
        match self {
            PadId::Primary => PadId::Vault,
            PadId::Vault => PadId::Primary,
        }
    }
}

/// Operations on a pad session (the core event surface)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadOp {
    Place { row: i8, col: i8 },
    SetRotation(Rotation),
    Undo,
    Redo,
    Reset,
}
