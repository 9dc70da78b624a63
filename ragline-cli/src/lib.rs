//! Library half of the `ragline` binary: argument definitions, collaborator
//! wiring and the interactive console.

pub mod cli;
pub mod commands;
pub mod console;

pub use cli::{Cli, Command, GlobalArgs, StoreKind};
pub use commands::run;
pub use console::{is_exit, run_console};
