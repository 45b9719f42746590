//! sqlci - Drive SQL Change Automation from a CI build.
//!
//! sqlci turns a build, test, sync or publish step into the token list the
//! SQL Change Automation PowerShell runner expects, stages the runner into
//! the build workspace and launches it with a composed environment. Secret
//! values never reach a log line or the captured output.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - `sqlci.yml` loading, merging and validation
//! - [`environment`] - Environment resolution and composition
//! - [`error`] - Error types and result aliases
//! - [`resources`] - Locating and staging the runner scripts
//! - [`runner`] - The invocation façade and multi-step pipelines
//! - [`secrets`] - Secret values, redaction and output masking
//! - [`shell`] - Argument escaping and process launching
//! - [`steps`] - Parameter sequences for each step kind
//!
//! # Example
//!
//! ```
//! use sqlci::shell::escape;
//!
//! assert_eq!(escape("MyDb.1.0.7.nupkg"), "MyDb.1.0.7.nupkg");
//! assert_eq!(escape("C:\\work dir"), "\"C:\\work dir\"");
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod resources;
pub mod runner;
pub mod secrets;
pub mod shell;
pub mod steps;

pub use error::{Result, SqlCiError};
