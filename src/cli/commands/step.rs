//! Single-step commands: `sqlci build|test|sync|publish`.

use crate::error::{Result, SqlCiError};
use crate::steps::{StepConfig, TokenBuilder};

use super::dispatcher::{Command, CommandResult, Session};

/// Runs one step described on the command line.
pub struct StepCommand {
    step: StepConfig,
}

impl StepCommand {
    pub fn new(step: StepConfig) -> Self {
        Self { step }
    }
}

impl Command for StepCommand {
    fn execute(&self, session: &mut Session) -> Result<CommandResult> {
        let errors = self.step.validate();
        if !errors.is_empty() {
            return Err(SqlCiError::ConfigValidationError {
                message: errors.join("; "),
            });
        }

        tracing::debug!("Running {} step", self.step.kind());
        let success = session.run_step(&self.step)?;
        Ok(CommandResult::from_success(success))
    }
}
