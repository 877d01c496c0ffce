//! Command registry, minibuffer, and the baseline command set bound by
//! the default keymap.

pub mod commands;
pub mod minibuffer;
pub mod registry;

pub use commands::register_baseline_commands;
pub use minibuffer::Minibuffer;
pub use registry::{djb2, Command, CommandCtx, CommandFn, CommandRegistry};
