//! End-to-end session behavior: placement, history, gate

use tui_tpad::core::{PadSession, PassGate};
use tui_tpad::types::{PadOp, Rotation, GATE_PASSCODE};

#[test]
fn test_rejected_place_leaves_board_and_history_unchanged() {
    let mut session = PadSession::new(8);
    assert!(session.place(0, 1));

    let board = session.board().clone();
    let history_len = session.history_len();
    let cursor = session.cursor();

    assert!(!session.place(0, 1), "overlapping anchor must be rejected");
    assert!(!session.place(7, 4), "bottom edge must be rejected at R0");

    assert_eq!(session.board(), &board);
    assert_eq!(session.history_len(), history_len);
    assert_eq!(session.cursor(), cursor);
}

#[test]
fn test_accepted_place_changes_exactly_four_cells() {
    let mut session = PadSession::new(8);
    assert!(session.place(0, 1));
    let first = session.board().clone();

    assert!(session.place(4, 4));
    let second = session.board();

    let mut changed = 0;
    for row in 0..8 {
        for col in 0..8 {
            let before = first.get(row, col).unwrap();
            let after = second.get(row, col).unwrap();
            if before != after {
                assert!(!before && after, "cells only go empty -> occupied");
                changed += 1;
            }
        }
    }
    assert_eq!(changed, 4);
}

#[test]
fn test_undo_redo_roundtrip_law() {
    let mut session = PadSession::new(8);
    session.place(0, 1);
    session.place(4, 4);
    let before_undo = session.board().clone();

    assert!(session.undo());
    assert!(session.redo());
    assert_eq!(session.board(), &before_undo);
}

#[test]
fn test_branching_truncation() {
    let mut session = PadSession::new(8);
    session.place(0, 1);
    session.place(4, 4);

    assert!(session.undo());
    assert!(session.can_redo());

    // A placement from the middle of history discards the redo branch.
    assert!(session.place(2, 5));
    assert!(!session.can_redo());
    assert!(!session.redo());

    // The discarded second placement is gone for good.
    assert!(session.board().is_open(4, 4));
}

#[test]
fn test_boundary_noops() {
    let mut session = PadSession::new(8);
    assert!(!session.undo(), "fresh session undo is a no-op");
    assert_eq!(session.cursor(), 0);

    session.place(0, 1);
    assert!(!session.redo(), "redo at the last snapshot is a no-op");
    assert_eq!(session.cursor(), 1);
}

#[test]
fn test_reset_regardless_of_prior_state() {
    let mut session = PadSession::new(7);
    session.place(0, 1);
    session.place(3, 3);
    session.undo();

    session.reset();
    assert!(session.board().is_empty());
    assert_eq!(session.history_len(), 1);
    assert!(!session.can_undo());
    assert!(!session.can_redo());

    // Reset on an already-fresh session still holds the invariant.
    session.reset();
    assert!(session.board().is_empty());
    assert_eq!(session.history_len(), 1);
}

#[test]
fn test_place_conflict_undo_redo_cycle() {
    let mut session = PadSession::new(8);

    assert!(session.place(0, 1));
    let occupied: Vec<(i8, i8)> = (0..8)
        .flat_map(|r| (0..8).map(move |c| (r, c)))
        .filter(|&(r, c)| session.board().is_occupied(r, c))
        .collect();
    assert_eq!(occupied, vec![(0, 1), (1, 0), (1, 1), (1, 2)]);

    assert!(!session.place(0, 1));

    assert!(session.undo());
    assert!(session.board().is_empty());

    assert!(session.redo());
    assert_eq!(session.board().occupied_count(), 4);
}

#[test]
fn test_rotation_persists_across_history_moves() {
    let mut session = PadSession::new(8);
    session.set_rotation(Rotation::R180);
    session.place(4, 4);
    session.undo();

    // History moves boards, not the rotation control.
    assert_eq!(session.rotation(), Rotation::R180);
}

#[test]
fn test_ops_drive_the_same_surface() {
    let mut session = PadSession::new(8);

    assert!(session.apply(PadOp::SetRotation(Rotation::R90)));
    assert!(session.apply(PadOp::Place { row: 4, col: 1 }));
    assert!(session.apply(PadOp::Undo));
    assert!(!session.apply(PadOp::Undo));
    assert!(session.apply(PadOp::Redo));
    assert!(session.apply(PadOp::Reset));
    assert!(session.board().is_empty());
}

#[test]
fn test_gate_flow() {
    let mut gate = PassGate::new();
    assert!(!gate.unlocked());

    assert!(!gate.try_unlock("9999"));
    assert!(gate.rejected());

    assert!(gate.try_unlock(GATE_PASSCODE));
    assert!(gate.unlocked());
    assert!(!gate.rejected());

    // Sticky after unlock.
    assert!(gate.try_unlock("9999"));
    assert!(gate.unlocked());
}

#[test]
fn test_pads_are_independent() {
    let mut primary = PadSession::new(8);
    let mut vault = PadSession::new(6);

    primary.place(0, 1);
    assert!(vault.board().is_empty());

    vault.set_rotation(Rotation::R270);
    assert_eq!(primary.rotation(), Rotation::R0);

    primary.undo();
    assert_eq!(vault.rotation(), Rotation::R270);
}
