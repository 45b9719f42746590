//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`Session`] for the state every command runs against
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::{load_config, load_merged_config, validate, ConfigPaths, SqlCiConfig};
use crate::environment::EnvFile;
use crate::error::{Result, SqlCiError};
use crate::resources::RunnerSource;
use crate::runner::{BuildContext, Invoker};
use crate::secrets::SecretMatcher;
use crate::shell::LaunchStrategy;
use crate::steps::{StepConfig, StepContext, TokenBuilder};

/// Trait for command implementations.
pub trait Command {
    /// Execute the command against a session.
    fn execute(&self, session: &mut Session) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Map a step outcome to a result, exit code 1 on failure.
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::success()
        } else {
            Self::failure(1)
        }
    }
}

/// Everything a command needs: loaded configuration, the step context and
/// the invocation context.
pub struct Session {
    /// Configuration, when one was found.
    pub config: Option<SqlCiConfig>,
    /// Where the configuration came from.
    pub config_path: PathBuf,
    pub step_ctx: StepContext,
    pub build: BuildContext,
    pub invoker: Invoker,
    /// Print commands instead of running them.
    pub dry_run: bool,
}

impl Session {
    /// The validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` when no configuration was loaded.
    pub fn require_config(&self) -> Result<&SqlCiConfig> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| SqlCiError::ConfigNotFound {
                path: self.config_path.clone(),
            })?;
        validate(config)?;
        Ok(config)
    }

    /// Run one step, or print it in dry-run mode.
    pub fn run_step(&mut self, step: &StepConfig) -> Result<bool> {
        let parameters = step.parameters(&self.step_ctx);
        if self.dry_run {
            let line = self.invoker.dry_run(&parameters, &self.build);
            writeln!(self.build.stdout, "{}", line)?;
            return Ok(true);
        }
        Ok(self.invoker.run(&parameters, &mut self.build))
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    workspace: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given workspace.
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    /// Get the workspace path.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Load configuration and build the session for a command line.
    pub fn session(&self, cli: &Cli) -> Result<Session> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| self.workspace.join(crate::config::CONFIG_FILE));

        let config = if cli.config.is_some() {
            Some(load_config(&self.workspace, cli.config.as_deref())?)
        } else if ConfigPaths::discover(&self.workspace).project.is_some() {
            Some(load_merged_config(&self.workspace)?)
        } else {
            None
        };

        let settings = config
            .as_ref()
            .map(|c| c.settings.clone())
            .unwrap_or_default();

        let mut variables: HashMap<String, String> = settings.variables;
        variables.extend(cli.vars.iter().cloned());

        let runner = cli
            .runner
            .clone()
            .map(RunnerSource::Path)
            .unwrap_or(settings.runner);

        let strategy = if cli.command_line {
            LaunchStrategy::CommandLine
        } else {
            settings.launch
        };

        let mut build = BuildContext::new(&self.workspace)
            .with_build_variables(variables)
            .with_interpreter(cli.interpreter.clone().or(settings.interpreter))
            .with_runner(runner)
            .with_strategy(strategy);
        build.secret_matcher = SecretMatcher::with_builtins_and_custom(&settings.secret_variables);

        if let Some(env_file) = cli.env_file.clone().or(settings.env_file) {
            build = build.with_resolver(EnvFile::new(self.workspace.join(env_file)));
        }

        tracing::debug!(
            "Session for {} (build {}, {} configured steps)",
            self.workspace.display(),
            cli.build_number,
            config.as_ref().map_or(0, |c| c.steps.len())
        );

        Ok(Session {
            config,
            config_path,
            step_ctx: StepContext::new(&self.workspace, cli.build_number),
            build,
            invoker: Invoker::new(),
            dry_run: cli.dry_run,
        })
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        let mut session = self.session(cli)?;

        match &cli.command {
            Commands::Build(args) => {
                super::step::StepCommand::new(StepConfig::Build(args.into())).execute(&mut session)
            }
            Commands::Test(args) => {
                super::step::StepCommand::new(StepConfig::Test(args.into())).execute(&mut session)
            }
            Commands::Sync(args) => {
                super::step::StepCommand::new(StepConfig::Sync(args.into())).execute(&mut session)
            }
            Commands::Publish(args) => {
                super::step::StepCommand::new(StepConfig::Publish(args.into()))
                    .execute(&mut session)
            }
            Commands::Run => super::run::RunCommand::new().execute(&mut session),
            Commands::Show(args) => {
                super::show::ShowCommand::new(args.clone()).execute(&mut session)
            }
        }
    }
}
