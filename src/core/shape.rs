//! Shape module - the T-tetromino offset tables
//!
//! Each rotation is a literal lookup of four cell offsets relative to the
//! anchor (the clicked cell); no rotation matrix is computed. Resolution is
//! deliberately unbounded: out-of-range coordinates are legitimate outputs
//! and bounds checking is the validator's job.

use crate::types::{Rotation, SHAPE_CELLS};

/// Offset of a single cell relative to the anchor, as (row, col)
pub type CellOffset = (i8, i8);

/// The four cells of the shape in one orientation
pub type ShapeCells = [CellOffset; SHAPE_CELLS];

/// Get the offset table for a rotation.
///
/// The anchor is always the first entry. R0 puts the bar below the anchor;
/// each step rotates the table a quarter turn clockwise around the anchor.
pub fn offsets(rotation: Rotation) -> ShapeCells {
    match rotation {
        Rotation::R0 => [(0, 0), (1, -1), (1, 0), (1, 1)],
        Rotation::R90 => [(0, 0), (-1, -1), (0, -1), (1, -1)],
        Rotation::R180 => [(0, 0), (-1, -1), (-1, 0), (-1, 1)],
        Rotation::R270 => [(0, 0), (-1, 1), (0, 1), (1, 1)],
    }
}

/// Resolve the absolute board cells for a placement anchored at (row, col).
pub fn resolve_cells(row: i8, col: i8, rotation: Rotation) -> ShapeCells {
    let mut cells = offsets(rotation);
    for cell in &mut cells {
        cell.0 += row;
        cell.1 += col;
    }
    cells
}
