//! tui-tpad: a terminal T-tetromino placement pad.
//!
//! Place a fixed four-cell shape on a small grid by clicking cells (mouse)
//! or with a keyboard cursor, with linear undo/redo history and reset. A
//! second pad sits behind a numeric passcode gate. A line-JSON TCP adapter
//! exposes the same operation surface to external clients.

pub mod adapter;
pub mod core;
pub mod input;
pub mod term;
pub mod types;
