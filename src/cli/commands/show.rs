//! Show command implementation.
//!
//! The `sqlci show` command prints the masked command line each configured
//! step would run.

use serde::Serialize;
use std::io::Write;

use crate::cli::args::ShowArgs;
use crate::error::{Result, SqlCiError};
use crate::steps::TokenBuilder;

use super::dispatcher::{Command, CommandResult, Session};

/// One step as printed by `show --json`.
#[derive(Debug, Serialize)]
pub struct ShownStep {
    pub index: usize,
    pub kind: String,
    pub command_line: String,
}

/// The show command implementation.
pub struct ShowCommand {
    args: ShowArgs,
}

impl ShowCommand {
    /// Create a new show command.
    pub fn new(args: ShowArgs) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ShowArgs {
        &self.args
    }

    fn collect(session: &Session) -> Result<Vec<ShownStep>> {
        let config = session.require_config()?;
        Ok(config
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| ShownStep {
                index,
                kind: step.kind().to_string(),
                command_line: session
                    .invoker
                    .dry_run(&step.parameters(&session.step_ctx), &session.build),
            })
            .collect())
    }
}

impl Command for ShowCommand {
    fn execute(&self, session: &mut Session) -> Result<CommandResult> {
        let shown = Self::collect(session)?;

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&shown).map_err(|e| SqlCiError::Other(e.into()))?;
            writeln!(session.build.stdout, "{}", json)?;
        } else {
            for step in &shown {
                writeln!(session.build.stdout, "# {}. {}", step.index + 1, step.kind)?;
                writeln!(session.build.stdout, "{}", step.command_line)?;
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, CommandDispatcher};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn collects_masked_command_lines() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("sqlci.yml"),
            r#"
steps:
  - sync:
      package_id: MyDb
      server_name: db1
      database_name: Prod
      auth:
        sql_server:
          username: sa
          password: p1
"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from(["sqlci", "--build-number", "3", "show"]).unwrap();
        let session = CommandDispatcher::new(temp.path().to_path_buf())
            .session(&cli)
            .unwrap();

        let shown = ShowCommand::collect(&session).unwrap();

        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, "sync");
        assert!(shown[0].command_line.contains("-package MyDb.1.0.3.nupkg"));
        assert!(shown[0].command_line.ends_with("-databasePassword ********"));
    }
}
