//! Run command implementation.
//!
//! The `sqlci run` command executes every configured step in order and
//! stops at the first failure.

use std::io::Write;

use crate::error::Result;
use crate::runner::{run_steps, RunProgress};

use super::dispatcher::{Command, CommandResult, Session};

/// The run command implementation.
#[derive(Debug, Default)]
pub struct RunCommand;

impl RunCommand {
    /// Create a new run command.
    pub fn new() -> Self {
        Self
    }
}

impl Command for RunCommand {
    fn execute(&self, session: &mut Session) -> Result<CommandResult> {
        let steps = session.require_config()?.steps.clone();

        if steps.is_empty() {
            tracing::warn!("No steps configured");
            return Ok(CommandResult::success());
        }

        if session.dry_run {
            for step in &steps {
                session.run_step(step)?;
            }
            return Ok(CommandResult::success());
        }

        let result = run_steps(
            &steps,
            &session.step_ctx,
            &mut session.build,
            &session.invoker,
            |progress| match progress {
                RunProgress::StepStarting { kind, index, total } => {
                    tracing::info!("[{}/{}] {}", index + 1, total, kind);
                }
                RunProgress::StepFinished { kind, success } => {
                    if !success {
                        tracing::info!("{} failed", kind);
                    }
                }
            },
        );

        let summary = if result.success {
            format!(
                "{} step(s) succeeded in {:.1}s",
                result.steps.len(),
                result.duration.as_secs_f64()
            )
        } else {
            format!(
                "Failed after {} step(s); {} not run",
                result.steps.len(),
                result.skipped
            )
        };
        writeln!(session.build.stderr, "{}", summary)?;

        Ok(CommandResult::from_success(result.success))
    }
}
