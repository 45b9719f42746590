//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! dispatched via [`CommandDispatcher`], which loads configuration and
//! applies global flags once for every subcommand.

pub mod dispatcher;
pub mod run;
pub mod show;
pub mod step;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, Session};
