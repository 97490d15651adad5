//! PadView: maps pad sessions into a terminal framebuffer.
//!
//! This module is pure (no I/O). Layout math is shared between rendering
//! and mouse hit-testing so a click always lands on the cell it appears in.

use crate::core::{resolve_cells, PadSession, PassGate};
use crate::term::fb::{FrameBuffer, GlyphStyle, Rgb};
use crate::types::PadId;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Everything the view needs to draw one frame.
pub struct ViewModel<'a> {
    pub primary: &'a PadSession,
    pub vault: &'a PadSession,
    pub gate: &'a PassGate,
    pub focus: PadId,
    /// Keyboard placement cursor on the focused pad, as (row, col)
    pub cursor: (i8, i8),
    /// Passcode entry buffer shown while the vault is locked
    pub entry: &'a str,
}

/// Screen rectangle of one pad's frame (border included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadRect {
    pub x: u16,
    pub y: u16,
    pub size: u8,
}

/// Computed positions of both pad frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub primary: PadRect,
    pub vault: PadRect,
}

/// Columns between the two pad frames.
const PAD_GAP: u16 = 6;

/// A lightweight terminal renderer for the placement pads.
pub struct PadView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for PadView {
    fn default() -> Self {
        // 2x1 compensates for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
        }
    }
}

impl PadView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
        }
    }

    fn frame_w(&self, size: u8) -> u16 {
        (size as u16) * self.cell_w + 2
    }

    fn frame_h(&self, size: u8) -> u16 {
        (size as u16) * self.cell_h + 2
    }

    /// Compute where both pad frames land in the viewport.
    pub fn layout(&self, primary_size: u8, vault_size: u8, viewport: Viewport) -> Layout {
        let total_w = self.frame_w(primary_size) + PAD_GAP + self.frame_w(vault_size);
        let tallest = self.frame_h(primary_size).max(self.frame_h(vault_size));

        let start_x = viewport.width.saturating_sub(total_w) / 2;
        // One title row above the frames, status lines below.
        let start_y = viewport.height.saturating_sub(tallest + 4) / 2 + 1;

        let primary = PadRect {
            x: start_x,
            y: start_y,
            size: primary_size,
        };
        let vault = PadRect {
            x: start_x + self.frame_w(primary_size) + PAD_GAP,
            y: start_y,
            size: vault_size,
        };

        Layout { primary, vault }
    }

    /// Map a terminal coordinate to the pad cell rendered there.
    pub fn hit_test(
        &self,
        primary_size: u8,
        vault_size: u8,
        viewport: Viewport,
        x: u16,
        y: u16,
    ) -> Option<(PadId, i8, i8)> {
        let layout = self.layout(primary_size, vault_size, viewport);

        for (pad, rect) in [
            (PadId::Primary, layout.primary),
            (PadId::Vault, layout.vault),
        ] {
            let inner_x = rect.x + 1;
            let inner_y = rect.y + 1;
            let inner_w = (rect.size as u16) * self.cell_w;
            let inner_h = (rect.size as u16) * self.cell_h;

            if x >= inner_x && x < inner_x + inner_w && y >= inner_y && y < inner_y + inner_h {
                let col = ((x - inner_x) / self.cell_w) as i8;
                let row = ((y - inner_y) / self.cell_h) as i8;
                return Some((pad, row, col));
            }
        }

        None
    }

    /// Render the current state into a framebuffer.
    pub fn render(&self, vm: &ViewModel, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        fb.clear(GlyphStyle::default().glyph(' '));

        let layout = self.layout(vm.primary.size(), vm.vault.size(), viewport);

        self.draw_pad(
            &mut fb,
            layout.primary,
            vm.primary,
            "PRIMARY",
            vm.focus == PadId::Primary,
            false,
            vm,
        );
        self.draw_pad(
            &mut fb,
            layout.vault,
            vm.vault,
            "VAULT",
            vm.focus == PadId::Vault,
            !vm.gate.unlocked(),
            vm,
        );

        self.draw_status(&mut fb, &layout, vm);

        fb
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_pad(
        &self,
        fb: &mut FrameBuffer,
        rect: PadRect,
        session: &PadSession,
        title: &str,
        focused: bool,
        locked: bool,
        vm: &ViewModel,
    ) {
        let frame_w = self.frame_w(rect.size);
        let frame_h = self.frame_h(rect.size);

        let border = if focused {
            GlyphStyle {
                fg: Rgb::new(240, 240, 240),
                bg: Rgb::new(0, 0, 0),
                bold: true,
                dim: false,
            }
        } else {
            GlyphStyle {
                fg: Rgb::new(140, 140, 140),
                bg: Rgb::new(0, 0, 0),
                bold: false,
                dim: false,
            }
        };

        // Title above the frame.
        let title_style = GlyphStyle {
            bold: focused,
            ..border
        };
        fb.put_str(rect.x + 1, rect.y.saturating_sub(1), title, title_style);

        self.draw_border(fb, rect.x, rect.y, frame_w, frame_h, border);

        if locked {
            self.draw_lock_panel(fb, rect, vm);
            return;
        }

        // Board cells.
        let occupied = GlyphStyle {
            fg: Rgb::new(230, 200, 80),
            bg: Rgb::new(110, 90, 20),
            bold: false,
            dim: false,
        };
        let empty = GlyphStyle {
            fg: Rgb::new(70, 70, 80),
            bg: Rgb::new(25, 25, 32),
            bold: false,
            dim: true,
        };

        for row in 0..rect.size as i8 {
            for col in 0..rect.size as i8 {
                if session.board().is_occupied(row, col) {
                    self.fill_cell(fb, rect, row, col, ' ', occupied);
                } else {
                    self.fill_cell(fb, rect, row, col, ' ', empty);
                    self.put_cell_char(fb, rect, row, col, '·', empty);
                }
            }
        }

        // Placement preview at the keyboard cursor.
        if focused {
            let (cur_row, cur_col) = vm.cursor;
            let ok = session.can_place(cur_row, cur_col);
            let preview = if ok {
                GlyphStyle {
                    fg: Rgb::new(120, 220, 120),
                    bg: Rgb::new(30, 70, 30),
                    bold: false,
                    dim: false,
                }
            } else {
                GlyphStyle {
                    fg: Rgb::new(220, 110, 110),
                    bg: Rgb::new(80, 25, 25),
                    bold: false,
                    dim: false,
                }
            };

            for (row, col) in resolve_cells(cur_row, cur_col, session.rotation()) {
                if !session.board().is_out_of_bounds(row, col) {
                    self.fill_cell(fb, rect, row, col, '░', preview);
                }
            }
        }
    }

    fn draw_lock_panel(&self, fb: &mut FrameBuffer, rect: PadRect, vm: &ViewModel) {
        let inner_x = rect.x + 1;
        let inner_w = (rect.size as u16) * self.cell_w;
        let inner_h = (rect.size as u16) * self.cell_h;
        let center_y = rect.y + 1 + inner_h / 2;

        let dim = GlyphStyle {
            fg: Rgb::new(120, 120, 130),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: true,
        };
        let strong = GlyphStyle {
            fg: Rgb::new(230, 230, 230),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        let warn = GlyphStyle {
            fg: Rgb::new(230, 120, 120),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: false,
        };

        let center = |s: &str| inner_x + inner_w.saturating_sub(s.len() as u16) / 2;

        fb.put_str(center("LOCKED"), center_y.saturating_sub(2), "LOCKED", strong);

        // Masked entry field with a caret slot.
        let masked: String = "*".repeat(vm.entry.len());
        let field = format!("code: {}_", masked);
        fb.put_str(center(&field), center_y, &field, dim);

        if vm.gate.rejected() {
            let msg = "wrong code, try again";
            fb.put_str(center(msg), center_y + 2, msg, warn);
        }
    }

    fn draw_status(&self, fb: &mut FrameBuffer, layout: &Layout, vm: &ViewModel) {
        let session = match vm.focus {
            PadId::Primary => vm.primary,
            PadId::Vault => vm.vault,
        };

        let enabled = GlyphStyle::default();
        let disabled = GlyphStyle {
            fg: Rgb::new(100, 100, 100),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: true,
        };

        let tallest = self
            .frame_h(layout.primary.size)
            .max(self.frame_h(layout.vault.size));
        let y = layout.primary.y + tallest + 1;
        let x = layout.primary.x;

        let status = format!(
            "rot {:>3}°  cells {:>2}  step {}/{}",
            session.rotation().degrees(),
            session.board().occupied_count(),
            session.cursor(),
            session.history_len().saturating_sub(1),
        );
        fb.put_str(x, y, &status, enabled);

        // Undo/redo availability mirrors the disabled-control convention.
        let mut cx = x;
        for (label, available) in [
            ("[u]ndo", session.can_undo()),
            ("  [y] redo", session.can_redo()),
            ("  [c] reset", true),
            ("  [x/z] rotate", true),
            ("  [tab] pad", true),
            ("  [q] quit", true),
        ] {
            let style = if available { enabled } else { disabled };
            fb.put_str(cx, y + 1, label, style);
            cx += label.len() as u16;
        }
    }

    fn draw_border(&self, fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: GlyphStyle) {
        if w < 2 || h < 2 {
            return;
        }

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);
    }

    fn fill_cell(
        &self,
        fb: &mut FrameBuffer,
        rect: PadRect,
        row: i8,
        col: i8,
        ch: char,
        style: GlyphStyle,
    ) {
        let x = rect.x + 1 + (col as u16) * self.cell_w;
        let y = rect.y + 1 + (row as u16) * self.cell_h;
        fb.fill_rect(x, y, self.cell_w, self.cell_h, ch, style);
    }

    fn put_cell_char(
        &self,
        fb: &mut FrameBuffer,
        rect: PadRect,
        row: i8,
        col: i8,
        ch: char,
        style: GlyphStyle,
    ) {
        // Centered-ish marker in the cell rectangle.
        let x = rect.x + 1 + (col as u16) * self.cell_w + self.cell_w / 2;
        let y = rect.y + 1 + (row as u16) * self.cell_h + self.cell_h / 2;
        fb.put_char(x, y, ch, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_PAD_SIZE, VAULT_PAD_SIZE};

    fn view_model<'a>(
        primary: &'a PadSession,
        vault: &'a PadSession,
        gate: &'a PassGate,
    ) -> ViewModel<'a> {
        ViewModel {
            primary,
            vault,
            gate,
            focus: PadId::Primary,
            cursor: (0, 1),
            entry: "",
        }
    }

    #[test]
    fn test_hit_test_maps_first_cell() {
        let view = PadView::default();
        let vp = Viewport::new(80, 30);
        let layout = view.layout(DEFAULT_PAD_SIZE, VAULT_PAD_SIZE, vp);

        // Top-left interior coordinate of the primary frame is cell (0, 0).
        let hit = view.hit_test(
            DEFAULT_PAD_SIZE,
            VAULT_PAD_SIZE,
            vp,
            layout.primary.x + 1,
            layout.primary.y + 1,
        );
        assert_eq!(hit, Some((PadId::Primary, 0, 0)));
    }

    #[test]
    fn test_hit_test_respects_cell_width() {
        let view = PadView::default();
        let vp = Viewport::new(80, 30);
        let layout = view.layout(DEFAULT_PAD_SIZE, VAULT_PAD_SIZE, vp);

        // Second column starts two terminal columns in (cell_w = 2).
        let hit = view.hit_test(
            DEFAULT_PAD_SIZE,
            VAULT_PAD_SIZE,
            vp,
            layout.primary.x + 1 + 2,
            layout.primary.y + 1,
        );
        assert_eq!(hit, Some((PadId::Primary, 0, 1)));
    }

    #[test]
    fn test_hit_test_finds_vault_pad() {
        let view = PadView::default();
        let vp = Viewport::new(80, 30);
        let layout = view.layout(DEFAULT_PAD_SIZE, VAULT_PAD_SIZE, vp);

        let hit = view.hit_test(
            DEFAULT_PAD_SIZE,
            VAULT_PAD_SIZE,
            vp,
            layout.vault.x + 1,
            layout.vault.y + 1,
        );
        assert_eq!(hit, Some((PadId::Vault, 0, 0)));
    }

    #[test]
    fn test_hit_test_misses_border_and_gap() {
        let view = PadView::default();
        let vp = Viewport::new(80, 30);
        let layout = view.layout(DEFAULT_PAD_SIZE, VAULT_PAD_SIZE, vp);

        assert_eq!(
            view.hit_test(
                DEFAULT_PAD_SIZE,
                VAULT_PAD_SIZE,
                vp,
                layout.primary.x,
                layout.primary.y
            ),
            None
        );
        // Just right of the primary frame sits the gap.
        let gap_x = layout.primary.x + view.frame_w(DEFAULT_PAD_SIZE) + 1;
        assert_eq!(
            view.hit_test(
                DEFAULT_PAD_SIZE,
                VAULT_PAD_SIZE,
                vp,
                gap_x,
                layout.primary.y + 1
            ),
            None
        );
    }

    #[test]
    fn test_render_locked_vault_shows_lock_text() {
        let primary = PadSession::new(DEFAULT_PAD_SIZE);
        let vault = PadSession::new(VAULT_PAD_SIZE);
        let gate = PassGate::new();
        let vm = view_model(&primary, &vault, &gate);

        let view = PadView::default();
        let fb = view.render(&vm, Viewport::new(80, 30));

        let all: String = (0..fb.height())
            .map(|y| fb.row_text(y))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(all.contains("LOCKED"));
        assert!(all.contains("code:"));
    }

    #[test]
    fn test_render_rejected_gate_shows_static_message() {
        let primary = PadSession::new(DEFAULT_PAD_SIZE);
        let vault = PadSession::new(VAULT_PAD_SIZE);
        let mut gate = PassGate::new();
        gate.try_unlock("0000");

        let vm = view_model(&primary, &vault, &gate);
        let view = PadView::default();
        let fb = view.render(&vm, Viewport::new(80, 30));

        let all: String = (0..fb.height())
            .map(|y| fb.row_text(y))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(all.contains("wrong code, try again"));
    }

    #[test]
    fn test_render_survives_tiny_viewport() {
        let primary = PadSession::new(DEFAULT_PAD_SIZE);
        let vault = PadSession::new(VAULT_PAD_SIZE);
        let gate = PassGate::new();
        let vm = view_model(&primary, &vault, &gate);

        let view = PadView::default();
        let fb = view.render(&vm, Viewport::new(4, 2));
        assert_eq!(fb.width(), 4);
        assert_eq!(fb.height(), 2);
    }
}
