//! Runner process launching and command-line escaping.

pub mod command;
pub mod escape;

pub use command::{
    interpreter_path, interpreter_path_with, launch, Invocation, InvocationResult, LaunchStrategy,
    DEFAULT_INTERPRETER, INTERPRETER_FLAGS, VERBOSE_FLAG,
};
pub use escape::{compose_command_line, compose_sh_command_line, escape, is_safe, sh_quote};
