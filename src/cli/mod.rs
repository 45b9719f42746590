//! Command-line interface for sqlci.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    BuildArgs, Cli, Commands, PublishArgs, ShowArgs, SyncArgs, TempServerArgs, TestArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult, Session};
