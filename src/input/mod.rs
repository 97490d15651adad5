//! Input module - keyboard mapping and cursor key repeat

pub mod handler;

pub use handler::{should_quit, CursorDir, InputHandler, PadAction};
