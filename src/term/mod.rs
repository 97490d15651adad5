//! Terminal presentation module
//!
//! Framebuffer types, the diff-based terminal renderer, and the pure pad
//! view that maps sessions onto the framebuffer.

pub mod fb;
pub mod pad_view;
pub mod renderer;

pub use fb::{FrameBuffer, Glyph, GlyphStyle, Rgb};
pub use pad_view::{PadView, ViewModel, Viewport};
pub use renderer::TerminalRenderer;
