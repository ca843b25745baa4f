//! Command interpreter over the virtual filesystem.
//!
//! The command set is a dispatch table of built-ins; adding a command means
//! adding an entry, see [`ShellSimulator::register`].

mod builtins;
pub mod error;
mod git;
pub mod lexer;
mod npm;
pub mod simulator;

pub use error::ShellError;
pub use simulator::{Builtin, ShellResult, ShellSimulator, DEFAULT_CWD, HOME};
