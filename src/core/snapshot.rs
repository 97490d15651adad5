//! Read-only session snapshot for observers
//!
//! A flat copy of everything the presentation layer and the adapter need to
//! render one pad, detached from the live session so it can cross threads.

use crate::core::PadSession;
use crate::types::Rotation;

/// Point-in-time copy of one pad's observable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadSnapshot {
    /// Board side length
    pub size: u8,
    /// Row-major cells, 0 = empty, 1 = occupied
    pub cells: Vec<u8>,
    pub rotation: Rotation,
    pub can_undo: bool,
    pub can_redo: bool,
    /// History cursor position
    pub cursor: u32,
    /// Number of snapshots in the history
    pub history_len: u32,
    pub revision: u32,
}

impl PadSnapshot {
    /// Cell at (row, col); 0 for out-of-range coordinates
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        if row >= self.size as usize || col >= self.size as usize {
            return 0;
        }
        self.cells[row * self.size as usize + col]
    }

    /// Refill from a session, reusing the cell allocation
    pub fn copy_from(&mut self, session: &PadSession) {
        let board = session.board();
        let size = board.size();

        self.size = size;
        self.cells.clear();
        self.cells
            .extend(board.cells().iter().map(|&c| u8::from(c)));
        self.rotation = session.rotation();
        self.can_undo = session.can_undo();
        self.can_redo = session.can_redo();
        self.cursor = session.cursor() as u32;
        self.history_len = session.history_len() as u32;
        self.revision = session.revision();
    }
}

impl Default for PadSnapshot {
    fn default() -> Self {
        Self {
            size: 0,
            cells: Vec::new(),
            rotation: Rotation::R0,
            can_undo: false,
            can_redo: false,
            cursor: 0,
            history_len: 1,
            revision: 0,
        }
    }
}

impl From<&PadSession> for PadSnapshot {
    fn from(session: &PadSession) -> Self {
        let mut snapshot = Self::default();
        snapshot.copy_from(session);
        snapshot
    }
}
