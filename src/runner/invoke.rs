//! The invocation façade: one call per build step.
//!
//! [`Invoker::run`] takes a step's parameters through staging, environment
//! composition and launch, and reduces the outcome to a boolean. Every
//! failure is reported to the context's error sink; nothing propagates.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::environment::{
    compose_environment, process_environment, EnvironmentResolver, EnvironmentSet, NoEnvironment,
};
use crate::error::Result;
use crate::resources::{bundled, installed, locate_runner, RunnerSource};
use crate::secrets::{has_dangling_sensitive_flag, OutputMasker, SecretMatcher};
use crate::shell::{interpreter_path, launch, Invocation, InvocationResult, LaunchStrategy};
use crate::steps::ParameterSequence;

/// Where one invocation is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    Staging,
    EnvironmentComposed,
    Launched,
    /// The runner exited with a code, zero or not.
    Completed,
    /// An error ended the invocation.
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvocationState::Idle => "idle",
            InvocationState::Staging => "staging",
            InvocationState::EnvironmentComposed => "environment composed",
            InvocationState::Launched => "launched",
            InvocationState::Completed => "completed",
            InvocationState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl InvocationState {
    fn advance(&mut self, next: InvocationState) {
        tracing::debug!("Invocation {} -> {}", self, next);
        *self = next;
    }
}

/// Everything a build step runs against.
pub struct BuildContext {
    /// Directory the runner is started in and resources are staged into.
    pub working_dir: PathBuf,
    /// Variables supplied by the build.
    pub build_variables: HashMap<String, String>,
    /// Source of the caller-resolved environment.
    pub resolver: Box<dyn EnvironmentResolver>,
    /// Interpreter override; `PS_HOME` and the default apply otherwise.
    pub interpreter: Option<PathBuf>,
    pub runner: RunnerSource,
    pub strategy: LaunchStrategy,
    /// Decides which environment values are masked in output.
    pub secret_matcher: SecretMatcher,
    /// Sink for the command line and the runner's stdout.
    pub stdout: Box<dyn Write + Send>,
    /// Sink for diagnostics and the runner's stderr.
    pub stderr: Box<dyn Write + Send>,
}

impl BuildContext {
    /// A context with default settings writing to the process streams.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            build_variables: HashMap::new(),
            resolver: Box::new(NoEnvironment),
            interpreter: None,
            runner: RunnerSource::default(),
            strategy: LaunchStrategy::default(),
            secret_matcher: SecretMatcher::with_builtins(),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    pub fn with_build_variables(mut self, vars: HashMap<String, String>) -> Self {
        self.build_variables = vars;
        self
    }

    pub fn with_resolver(mut self, resolver: impl EnvironmentResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_interpreter(mut self, interpreter: Option<PathBuf>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_runner(mut self, runner: RunnerSource) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_strategy(mut self, strategy: LaunchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Redirect both sinks.
    pub fn with_sinks(
        mut self,
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
    ) -> Self {
        self.stdout = Box::new(stdout);
        self.stderr = Box::new(stderr);
        self
    }

    fn interpreter(&self) -> PathBuf {
        interpreter_path(self.interpreter.as_deref())
    }
}

/// What happened to one invocation.
#[derive(Debug)]
pub struct InvocationOutcome {
    /// Final state, either completed or failed.
    pub state: InvocationState,
    /// Present when the runner exited with a code.
    pub result: Option<InvocationResult>,
}

impl InvocationOutcome {
    /// Whether the runner exited with code 0.
    pub fn success(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.success)
    }
}

/// Runs build steps through the external runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invoker;

impl Invoker {
    pub fn new() -> Self {
        Self
    }

    /// Run one step. Returns `true` only when the runner exits with 0.
    pub fn run(&self, parameters: &ParameterSequence, ctx: &mut BuildContext) -> bool {
        self.invoke(parameters, ctx).success()
    }

    /// Run one step and report the final state along with the result.
    pub fn invoke(&self, parameters: &ParameterSequence, ctx: &mut BuildContext) -> InvocationOutcome {
        let mut state = InvocationState::Idle;

        match self.try_invoke(parameters, ctx, &mut state) {
            Ok(result) => {
                state.advance(InvocationState::Completed);
                if !result.success {
                    tracing::info!("Runner exited with code {}", result.exit_code);
                }
                InvocationOutcome {
                    state,
                    result: Some(result),
                }
            }
            Err(e) => {
                state.advance(InvocationState::Failed);
                tracing::debug!("Invocation failed: {}", e);
                if let Err(write_err) = writeln!(ctx.stderr, "ERROR: {}", e) {
                    tracing::debug!("Could not report error: {}", write_err);
                }
                InvocationOutcome {
                    state,
                    result: None,
                }
            }
        }
    }

    fn try_invoke(
        &self,
        parameters: &ParameterSequence,
        ctx: &mut BuildContext,
        state: &mut InvocationState,
    ) -> Result<InvocationResult> {
        if has_dangling_sensitive_flag(&parameters.values()) {
            tracing::warn!("Last parameter is a sensitive flag with no value");
        }

        state.advance(InvocationState::Staging);
        let location = locate_runner(&ctx.runner, &ctx.working_dir)?;

        let environment = compose_environment(
            &process_environment(),
            &ctx.build_variables,
            ctx.resolver.as_ref(),
        );
        state.advance(InvocationState::EnvironmentComposed);

        let masker = masker_for(parameters, &environment, &ctx.secret_matcher);
        let invocation = Invocation {
            interpreter: ctx.interpreter(),
            runner: location.runner,
            parameters,
            working_dir: ctx.working_dir.clone(),
            environment: &environment,
            strategy: ctx.strategy,
        };

        state.advance(InvocationState::Launched);
        let result = launch(&invocation, &masker, &mut *ctx.stdout, &mut *ctx.stderr)?;

        if let Err(e) = ctx.stdout.flush() {
            tracing::debug!("Could not flush output: {}", e);
        }
        Ok(result)
    }

    /// Render the masked command line a step would run, without staging
    /// resources or starting anything.
    pub fn dry_run(&self, parameters: &ParameterSequence, ctx: &BuildContext) -> String {
        let runner = match &ctx.runner {
            RunnerSource::Path(path) => ctx.working_dir.join(path),
            RunnerSource::Installed => {
                installed::find().unwrap_or_else(|_| PathBuf::from(installed::INSTALLED_SCRIPT))
            }
            RunnerSource::Bundled => ctx
                .working_dir
                .join(bundled::STAGING_DIR)
                .join(bundled::RUNNER_SCRIPT),
        };

        let environment = EnvironmentSet::new();
        Invocation {
            interpreter: ctx.interpreter(),
            runner,
            parameters,
            working_dir: ctx.working_dir.clone(),
            environment: &environment,
            strategy: ctx.strategy,
        }
        .masked_command_line()
    }
}

/// Masker covering every sensitive parameter and every supplied environment
/// value whose name looks secret. Inherited variables such as `PWD` are
/// never masked.
fn masker_for(
    parameters: &ParameterSequence,
    environment: &EnvironmentSet,
    matcher: &SecretMatcher,
) -> OutputMasker {
    let mut masker = OutputMasker::new();
    masker.add_secrets(parameters.sensitive_values());
    masker.add_secrets(matcher.secret_values(environment.overrides()));
    tracing::debug!("Masking {} secret values", masker.secret_count());
    masker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StaticEnvironment;
    use crate::secrets::{Secret, MASK};
    use std::sync::{Arc, Mutex};

    /// A sink tests can read back after the context is done with it.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn state_display_names() {
        assert_eq!(InvocationState::EnvironmentComposed.to_string(), "environment composed");
        assert_eq!(InvocationState::Failed.to_string(), "failed");
    }

    #[test]
    fn missing_runner_fails_before_launch() {
        let temp = tempfile::TempDir::new().unwrap();
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let mut ctx = BuildContext::new(temp.path())
            .with_runner(RunnerSource::Path("missing.ps1".into()))
            .with_sinks(out.clone(), err.clone());

        let params = ParameterSequence::from_values(["Build"]);
        let outcome = Invoker::new().invoke(&params, &mut ctx);

        assert_eq!(outcome.state, InvocationState::Failed);
        assert!(outcome.result.is_none());
        assert!(err.contents().starts_with("ERROR: missing.ps1 cannot be found"));
        assert!(out.contents().is_empty());
    }

    #[test]
    fn masker_covers_parameters_and_secret_variables() {
        let params = ParameterSequence::builder()
            .secret_pair("-nugetFeedApiKey", Secret::new("k1"))
            .build();
        let env = compose_environment(
            &HashMap::new(),
            &HashMap::from([("SQL_PASSWORD".to_string(), "pw".to_string())]),
            &StaticEnvironment::default(),
        );

        let masker = masker_for(&params, &env, &SecretMatcher::with_builtins());
        assert_eq!(masker.mask("k1 pw"), format!("{} {}", MASK, MASK));
    }

    #[test]
    fn inherited_working_directory_is_not_masked() {
        let env = compose_environment(
            &HashMap::from([
                ("PWD".to_string(), "/work/proj".to_string()),
                ("OLDPWD".to_string(), "/".to_string()),
            ]),
            &HashMap::new(),
            &StaticEnvironment::default(),
        );

        let masker = masker_for(
            &ParameterSequence::from_values(["Build"]),
            &env,
            &SecretMatcher::with_builtins(),
        );
        assert_eq!(masker.secret_count(), 0);
        assert_eq!(
            masker.mask("-scriptsFolder /work/proj/db"),
            "-scriptsFolder /work/proj/db"
        );
    }

    #[test]
    fn dry_run_masks_secrets_without_staging() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = BuildContext::new(temp.path()).with_interpreter(Some("/usr/bin/pwsh".into()));
        let params = ParameterSequence::builder()
            .arg("Sync")
            .secret_pair("-databasePassword", Secret::new("pw"))
            .build();

        let line = Invoker::new().dry_run(&params, &ctx);

        assert!(line.starts_with("\"/usr/bin/pwsh\" -NonInteractive -ExecutionPolicy Bypass -File "));
        assert!(line.contains("SqlChangeAutomationRunner.ps1 -Verbose Sync"));
        assert!(line.ends_with("-databasePassword ********"));
        assert!(!temp.path().join("PowerShell").exists());
    }
}
