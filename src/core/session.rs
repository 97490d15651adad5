//! Session module - one pad's complete interactive state
//!
//! Ties together the board, shape geometry, and undo/redo history behind
//! the operation surface the presentation layer and the adapter both use.
//! Placement follows validate-then-apply: the current snapshot is cloned,
//! mutated, and recorded only after every target cell checks out, so a
//! rejected placement leaves both board and history untouched.

use crate::core::shape::resolve_cells;
use crate::core::{Board, History};
use crate::types::{PadOp, Rotation};

/// Interactive state for a single pad
#[derive(Debug, Clone)]
pub struct PadSession {
    history: History,
    rotation: Rotation,
    /// Monotonic (wrapping) counter of observable state changes.
    ///
    /// Consumed by the renderer and the adapter to decide when to emit.
    revision: u32,
}

impl PadSession {
    /// Create a session over a fresh empty board of the given side length
    pub fn new(size: u8) -> Self {
        Self {
            history: History::new(Board::new(size)),
            rotation: Rotation::R0,
            revision: 0,
        }
    }

    /// Side length of this pad's board
    pub fn size(&self) -> u8 {
        self.board().size()
    }

    /// The currently displayed board snapshot
    pub fn board(&self) -> &Board {
        self.history.current()
    }

    /// Rotation used by subsequent placements
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// History cursor position
    pub fn cursor(&self) -> usize {
        self.history.cursor()
    }

    /// Number of snapshots in the history
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Check whether a placement anchored at (row, col) would be accepted.
    ///
    /// True iff all four resolved cells are within bounds and empty.
    pub fn can_place(&self, row: i8, col: i8) -> bool {
        resolve_cells(row, col, self.rotation)
            .iter()
            .all(|&(r, c)| self.board().is_open(r, c))
    }

    /// Attempt a placement at the current rotation.
    ///
    /// On accept, records a new snapshot (truncating any redo entries) and
    /// returns true. On reject, returns false and changes nothing; an
    /// invalid placement is a normal outcome, not an error.
    pub fn place(&mut self, row: i8, col: i8) -> bool {
        let cells = resolve_cells(row, col, self.rotation);

        let mut next = self.board().clone();
        if !next.occupy_cells(&cells) {
            return false;
        }

        self.history.record(next);
        self.bump();
        true
    }

    /// Change the rotation used by subsequent placements. Always succeeds.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.bump();
        }
    }

    /// Step the rotation one quarter turn clockwise
    pub fn rotate_cw(&mut self) {
        self.set_rotation(self.rotation.cw());
    }

    /// Step the rotation one quarter turn counter-clockwise
    pub fn rotate_ccw(&mut self) {
        self.set_rotation(self.rotation.ccw());
    }

    /// Step back one snapshot; defined no-op at the start
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.bump();
        }
        moved
    }

    /// Step forward one snapshot; defined no-op at the end
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.bump();
        }
        moved
    }

    /// Return to a single all-empty snapshot of the same size
    pub fn reset(&mut self) {
        let size = self.size();
        self.history.reset(Board::new(size));
        self.bump();
    }

    /// Apply an operation, returning whether it changed anything.
    ///
    /// `Place` reports acceptance; `Undo`/`Redo` report cursor movement;
    /// `SetRotation` and `Reset` always succeed.
    pub fn apply(&mut self, op: PadOp) -> bool {
        match op {
            PadOp::Place { row, col } => self.place(row, col),
            PadOp::SetRotation(rotation) => {
                self.set_rotation(rotation);
                true
            }
            PadOp::Undo => self.undo(),
            PadOp::Redo => self.redo(),
            PadOp::Reset => {
                self.reset();
                true
            }
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Default for PadSession {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_PAD_SIZE)
    }
}
