//! TerminalRenderer: flushes a framebuffer to a real terminal.
//!
//! Raw mode + alternate screen + mouse capture (placements are driven by
//! pointer clicks). Draws are diffed against the previous frame so only
//! changed runs are rewritten.

use std::io::{self, Write};

use anyhow::Result;

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, QueueableCommand,
};

use crate::term::fb::{FrameBuffer, GlyphStyle, Rgb};

pub struct TerminalRenderer {
    stdout: io::Stdout,
    last: Option<FrameBuffer>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            last: None,
        }
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.stdout.queue(terminal::EnterAlternateScreen)?;
        self.stdout.queue(EnableMouseCapture)?;
        self.stdout.queue(cursor::Hide)?;
        self.stdout.queue(terminal::DisableLineWrap)?;
        self.stdout.flush()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.stdout.queue(ResetColor)?;
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(terminal::EnableLineWrap)?;
        self.stdout.queue(cursor::Show)?;
        self.stdout.queue(DisableMouseCapture)?;
        self.stdout.queue(terminal::LeaveAlternateScreen)?;
        self.stdout.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Force the next draw to be a full redraw (e.g. after a resize event).
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Draw a framebuffer, swapping it into internal state.
    ///
    /// Callers keep one `FrameBuffer` and pass it in every frame. The
    /// renderer diffs against the previous frame and then swaps buffers so
    /// the caller can reuse the old one without cloning.
    pub fn draw_swap(&mut self, fb: &mut FrameBuffer) -> Result<()> {
        if self.last.is_none() {
            self.last = Some(FrameBuffer::new(fb.width(), fb.height()));
            return self.full_redraw_and_swap(fb);
        }

        let mut prev = self.last.take().expect("checked above");
        if prev.width() != fb.width() || prev.height() != fb.height() {
            self.full_redraw(fb)?;
            prev.resize(fb.width(), fb.height());
        } else {
            self.diff_redraw(fb, &prev)?;
        }

        std::mem::swap(&mut prev, fb);
        self.last = Some(prev);
        Ok(())
    }

    fn full_redraw_and_swap(&mut self, fb: &mut FrameBuffer) -> Result<()> {
        self.full_redraw(fb)?;
        let mut prev = self.last.take().expect("set by caller");
        std::mem::swap(&mut prev, fb);
        self.last = Some(prev);
        Ok(())
    }

    fn full_redraw(&mut self, fb: &FrameBuffer) -> Result<()> {
        self.stdout
            .queue(terminal::Clear(terminal::ClearType::All))?;
        self.stdout.queue(cursor::MoveTo(0, 0))?;

        let mut current_style: Option<GlyphStyle> = None;
        for y in 0..fb.height() {
            for x in 0..fb.width() {
                let glyph = fb.get(x, y).unwrap_or_default();
                if current_style != Some(glyph.style) {
                    self.apply_style(glyph.style)?;
                    current_style = Some(glyph.style);
                }
                self.stdout.queue(Print(glyph.ch))?;
            }
            if y + 1 < fb.height() {
                self.stdout.queue(Print("\r\n"))?;
            }
        }

        self.stdout.queue(ResetColor)?;
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.flush()?;
        Ok(())
    }

    fn diff_redraw(&mut self, next: &FrameBuffer, prev: &FrameBuffer) -> Result<()> {
        let mut current_style: Option<GlyphStyle> = None;

        for_each_changed_run(prev, next, |x, y, len| {
            self.stdout.queue(cursor::MoveTo(x, y))?;
            for dx in 0..len {
                let glyph = next.get(x + dx, y).unwrap_or_default();
                if current_style != Some(glyph.style) {
                    self.apply_style(glyph.style)?;
                    current_style = Some(glyph.style);
                }
                self.stdout.queue(Print(glyph.ch))?;
            }
            Ok(())
        })?;

        self.stdout.queue(ResetColor)?;
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.flush()?;
        Ok(())
    }

    fn apply_style(&mut self, style: GlyphStyle) -> Result<()> {
        self.stdout
            .queue(SetForegroundColor(rgb_to_color(style.fg)))?;
        self.stdout
            .queue(SetBackgroundColor(rgb_to_color(style.bg)))?;
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        if style.bold {
            self.stdout.queue(SetAttribute(Attribute::Bold))?;
        }
        if style.dim {
            self.stdout.queue(SetAttribute(Attribute::Dim))?;
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn rgb_to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

fn for_each_changed_run(
    prev: &FrameBuffer,
    next: &FrameBuffer,
    mut f: impl FnMut(u16, u16, u16) -> Result<()>,
) -> Result<()> {
    if prev.width() != next.width() || prev.height() != next.height() {
        // Size changed: treat everything as dirty in row runs.
        for y in 0..next.height() {
            f(0, y, next.width())?;
        }
        return Ok(());
    }

    let w = next.width();
    let h = next.height();

    for y in 0..h {
        let mut x = 0;
        while x < w {
            let a = prev.get(x, y).unwrap_or_default();
            let b = next.get(x, y).unwrap_or_default();
            if a == b {
                x += 1;
                continue;
            }

            let start = x;
            x += 1;
            while x < w {
                let a2 = prev.get(x, y).unwrap_or_default();
                let b2 = next.get(x, y).unwrap_or_default();
                if a2 == b2 {
                    break;
                }
                x += 1;
            }
            f(start, y, x - start)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::fb::Glyph;

    #[test]
    fn test_rgb_conversion() {
        let rgb = Rgb::new(10, 20, 30);
        assert_eq!(
            rgb_to_color(rgb),
            Color::Rgb {
                r: 10,
                g: 20,
                b: 30
            }
        );
    }

    #[test]
    fn test_changed_run_coalesces_adjacent_cells() {
        let style = GlyphStyle::default();
        let a = FrameBuffer::new(5, 1);
        let mut b = FrameBuffer::new(5, 1);

        for x in 1..=3 {
            b.set(x, 0, Glyph { ch: 'X', style });
        }

        let mut runs = Vec::new();
        for_each_changed_run(&a, &b, |x, y, len| {
            runs.push((x, y, len));
            Ok(())
        })
        .unwrap();
        assert_eq!(runs, vec![(1, 0, 3)]);
    }

    #[test]
    fn test_changed_run_size_mismatch_marks_all_rows() {
        let a = FrameBuffer::new(2, 2);
        let b = FrameBuffer::new(3, 2);

        let mut runs = Vec::new();
        for_each_changed_run(&a, &b, |x, y, len| {
            runs.push((x, y, len));
            Ok(())
        })
        .unwrap();
        assert_eq!(runs, vec![(0, 0, 3), (0, 1, 3)]);
    }
}
