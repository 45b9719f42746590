//! Launching the runner process.

use serde::Deserialize;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::escape::{compose_command_line, compose_sh_command_line};
use crate::environment::EnvironmentSet;
use crate::error::{Result, SqlCiError};
use crate::secrets::OutputMasker;
use crate::steps::ParameterSequence;

/// Interpreter used when neither a configured path nor `PS_HOME` is set.
pub const DEFAULT_INTERPRETER: &str = r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";

/// Flags placed between the interpreter and the runner script.
pub const INTERPRETER_FLAGS: [&str; 4] = ["-NonInteractive", "-ExecutionPolicy", "Bypass", "-File"];

/// Flag placed between the runner script and the step parameters.
pub const VERBOSE_FLAG: &str = "-Verbose";

/// How the final command reaches the operating system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchStrategy {
    /// Tokens are passed as a discrete argument vector.
    #[default]
    ArgumentList,
    /// Tokens are escaped into one string run by the platform shell.
    CommandLine,
}

/// Resolve the interpreter from a configured path or `PS_HOME`.
pub fn interpreter_path(configured: Option<&Path>) -> PathBuf {
    interpreter_path_with(configured, std::env::var("PS_HOME").ok())
}

/// Resolve the interpreter given an explicit `PS_HOME` value.
pub fn interpreter_path_with(configured: Option<&Path>, ps_home: Option<String>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or_else(|| ps_home.filter(|home| !home.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INTERPRETER))
}

/// Shell and flag used to run a flat command line.
fn platform_shell() -> (String, &'static str) {
    if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    }
}

/// Everything needed to start the runner once.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub interpreter: PathBuf,
    pub runner: PathBuf,
    pub parameters: &'a ParameterSequence,
    pub working_dir: PathBuf,
    pub environment: &'a EnvironmentSet,
    pub strategy: LaunchStrategy,
}

impl Invocation<'_> {
    fn prefix(&self) -> Vec<String> {
        INTERPRETER_FLAGS
            .iter()
            .map(|flag| flag.to_string())
            .chain([
                self.runner.display().to_string(),
                VERBOSE_FLAG.to_string(),
            ])
            .collect()
    }

    /// Arguments after the interpreter, with real token values.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = self.prefix();
        args.extend(self.parameters.values().into_iter().map(str::to_string));
        args
    }

    /// Arguments after the interpreter, with sensitive values masked.
    pub fn masked_arguments(&self) -> Vec<String> {
        let mut args = self.prefix();
        args.extend(self.parameters.masked());
        args
    }

    /// The full command line as it may be logged.
    pub fn masked_command_line(&self) -> String {
        compose_command_line(&self.interpreter.display().to_string(), &self.masked_arguments())
    }

    /// The full command line with real values, as the platform shell
    /// receives it for the flat strategy.
    ///
    /// `cmd.exe` gets the escaped line; `/bin/sh` gets single-quoted tokens.
    pub fn command_line(&self) -> String {
        let program = self.interpreter.display().to_string();
        if cfg!(windows) {
            compose_command_line(&program, &self.arguments())
        } else {
            compose_sh_command_line(&program, &self.arguments())
        }
    }

    fn command(&self) -> Command {
        match self.strategy {
            LaunchStrategy::ArgumentList => {
                let mut cmd = Command::new(&self.interpreter);
                cmd.args(self.arguments());
                cmd
            }
            LaunchStrategy::CommandLine => {
                let (shell, flag) = platform_shell();
                let mut cmd = Command::new(shell);
                cmd.arg(flag);
                append_command_line(&mut cmd, self.command_line());
                cmd
            }
        }
    }
}

#[cfg(windows)]
fn append_command_line(cmd: &mut Command, line: String) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(line);
}

#[cfg(not(windows))]
fn append_command_line(cmd: &mut Command, line: String) {
    cmd.arg(line);
}

/// Outcome of a runner process that exited on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Whether the exit code was 0.
    pub success: bool,
    pub exit_code: i32,
    pub duration: Duration,
}

/// Start the runner, stream its output into the sinks, and wait for it.
///
/// The masked command line is written to `stdout` first. Both output
/// streams are copied line by line through `masker` on their own threads.
pub fn launch(
    invocation: &Invocation<'_>,
    masker: &OutputMasker,
    stdout: &mut (dyn Write + Send),
    stderr: &mut (dyn Write + Send),
) -> Result<InvocationResult> {
    let shown = invocation.masked_command_line();
    let process_error = |source: io::Error| SqlCiError::ProcessIo {
        command: shown.clone(),
        source,
    };

    tracing::info!("Executing {}", shown);
    writeln!(stdout, "{}", shown).map_err(process_error)?;

    let start = Instant::now();

    let mut cmd = invocation.command();
    // Applied over the inherited environment so variables that are not
    // valid UTF-8 still reach the child.
    cmd.current_dir(&invocation.working_dir)
        .envs(invocation.environment.iter())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(process_error)?;
    tracing::debug!("Started process {}", child.id());

    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let (copied_stdout, copied_stderr) = thread::scope(|scope| {
        let out = scope.spawn(move || copy_masked(child_stdout, masker, stdout));
        let err = scope.spawn(move || copy_masked(child_stderr, masker, stderr));
        (join_copy(out), join_copy(err))
    });

    let status = child.wait().map_err(process_error)?;

    copied_stdout.map_err(process_error)?;
    copied_stderr.map_err(process_error)?;

    let duration = start.elapsed();
    // No exit code means the child was killed by a signal.
    let Some(exit_code) = status.code() else {
        return Err(SqlCiError::Interrupted {
            command: shown.clone(),
        });
    };

    tracing::debug!("Process exited with {} after {:?}", exit_code, duration);

    Ok(InvocationResult {
        success: exit_code == 0,
        exit_code,
        duration,
    })
}

fn join_copy(handle: thread::ScopedJoinHandle<'_, io::Result<()>>) -> io::Result<()> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("output copy thread panicked")))
}

/// Copy a child stream into a sink line by line, masking secrets.
///
/// If the sink fails, the rest of the stream is drained so the child never
/// blocks on a full pipe.
fn copy_masked<R: Read>(
    reader: Option<R>,
    masker: &OutputMasker,
    sink: &mut (dyn Write + Send),
) -> io::Result<()> {
    let Some(reader) = reader else {
        return Ok(());
    };

    let mut reader = BufReader::new(reader);
    let mut writer = masker.writer(sink);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if let Err(e) = writer.write_all(&line) {
            io::copy(&mut reader, &mut io::sink())?;
            return Err(e);
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvSource;
    use crate::secrets::Secret;

    fn sequence() -> ParameterSequence {
        ParameterSequence::builder()
            .arg("Sync")
            .pair("-databaseServer", "db1")
            .secret_pair("-databasePassword", Secret::new("pa55-w0rd"))
            .build()
    }

    fn invocation<'a>(
        params: &'a ParameterSequence,
        env: &'a EnvironmentSet,
        interpreter: &str,
    ) -> Invocation<'a> {
        Invocation {
            interpreter: PathBuf::from(interpreter),
            runner: PathBuf::from("/work/PowerShell/SqlChangeAutomationRunner.ps1"),
            parameters: params,
            working_dir: PathBuf::from("/work"),
            environment: env,
            strategy: LaunchStrategy::ArgumentList,
        }
    }

    #[test]
    fn configured_interpreter_wins() {
        let path = interpreter_path_with(Some(Path::new("/usr/bin/pwsh")), Some("/ps".into()));
        assert_eq!(path, PathBuf::from("/usr/bin/pwsh"));
    }

    #[test]
    fn ps_home_is_used_when_not_configured() {
        assert_eq!(interpreter_path_with(None, Some("/ps".into())), PathBuf::from("/ps"));
    }

    #[test]
    fn default_interpreter_as_last_resort() {
        assert_eq!(
            interpreter_path_with(None, None),
            PathBuf::from(DEFAULT_INTERPRETER)
        );
        assert_eq!(
            interpreter_path_with(None, Some(String::new())),
            PathBuf::from(DEFAULT_INTERPRETER)
        );
    }

    #[test]
    fn arguments_follow_fixed_prefix() {
        let params = sequence();
        let env = EnvironmentSet::new();
        let inv = invocation(&params, &env, "pwsh");

        assert_eq!(
            inv.arguments(),
            vec![
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-File",
                "/work/PowerShell/SqlChangeAutomationRunner.ps1",
                "-Verbose",
                "Sync",
                "-databaseServer",
                "db1",
                "-databasePassword",
                "pa55-w0rd",
            ]
        );
    }

    #[test]
    fn masked_command_line_hides_secrets() {
        let params = sequence();
        let env = EnvironmentSet::new();
        let inv = invocation(&params, &env, "/opt/power shell/pwsh");

        let line = inv.masked_command_line();
        assert!(line.starts_with("\"/opt/power shell/pwsh\" -NonInteractive"));
        assert!(line.ends_with("-databasePassword ********"));
        assert!(!inv.command_line().contains("********"));
    }

    #[test]
    fn strategy_deserializes_kebab_case() {
        let strategy: LaunchStrategy = serde_yaml::from_str("command-line").unwrap();
        assert_eq!(strategy, LaunchStrategy::CommandLine);
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        const STUB: &str = r#"#!/bin/sh
for arg in "$@"; do
  printf 'arg=%s\n' "$arg"
done
echo "marker=$REDGATE_FUR_ENVIRONMENT"
echo "password was pa55-w0rd" >&2
case "$STUB_MODE" in
  fail) exit 3 ;;
  kill) kill -9 $$ ;;
esac
exit 0
"#;

        fn stub(dir: &Path) -> PathBuf {
            let path = dir.join("stub-pwsh");
            fs::write(&path, STUB).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn environment(mode: &str) -> EnvironmentSet {
            let mut env = EnvironmentSet::new();
            env.apply(
                EnvSource::BuildVariables,
                [
                    ("STUB_MODE".to_string(), mode.to_string()),
                    ("REDGATE_FUR_ENVIRONMENT".to_string(), "Jenkins Plugin".to_string()),
                ],
            );
            env
        }

        fn run(
            strategy: LaunchStrategy,
            mode: &str,
        ) -> (Result<InvocationResult>, String, String) {
            let temp = TempDir::new().unwrap();
            let interpreter = stub(temp.path());
            let params = sequence();
            let env = environment(mode);
            let inv = Invocation {
                interpreter,
                runner: temp.path().join("runner.ps1"),
                parameters: &params,
                working_dir: temp.path().to_path_buf(),
                environment: &env,
                strategy,
            };

            let mut masker = OutputMasker::new();
            masker.add_secrets(params.sensitive_values());

            let mut out = Vec::new();
            let mut err = Vec::new();
            let result = launch(&inv, &masker, &mut out, &mut err);
            (
                result,
                String::from_utf8(out).unwrap(),
                String::from_utf8(err).unwrap(),
            )
        }

        #[test]
        fn exit_zero_is_success() {
            let (result, out, _) = run(LaunchStrategy::ArgumentList, "ok");
            let result = result.unwrap();

            assert!(result.success);
            assert_eq!(result.exit_code, 0);
            assert!(out.contains("arg=-NonInteractive\n"));
            assert!(out.contains("arg=-databaseServer\narg=db1\n"));
            assert!(out.contains("marker=Jenkins Plugin\n"));
        }

        #[test]
        fn nonzero_exit_is_failure() {
            let (result, _, _) = run(LaunchStrategy::ArgumentList, "fail");
            let result = result.unwrap();

            assert!(!result.success);
            assert_eq!(result.exit_code, 3);
        }

        #[test]
        fn secrets_are_masked_in_both_streams() {
            let (result, out, err) = run(LaunchStrategy::ArgumentList, "ok");
            result.unwrap();

            assert!(!out.contains("pa55-w0rd"));
            assert!(out.contains("arg=********"));
            assert_eq!(err, "password was ********\n");
        }

        #[test]
        fn command_line_is_logged_first() {
            let (_, out, _) = run(LaunchStrategy::ArgumentList, "ok");
            let first = out.lines().next().unwrap();
            assert!(first.contains("-File"));
            assert!(first.ends_with("-databasePassword ********"));
        }

        #[test]
        fn command_line_strategy_runs_through_shell() {
            let (result, out, _) = run(LaunchStrategy::CommandLine, "ok");

            assert!(result.unwrap().success);
            assert!(out.contains("arg=Sync\n"));
            assert!(out.contains("arg=-databasePassword\narg=********\n"));
        }

        #[test]
        fn command_line_strategy_round_trips_awkward_tokens() {
            let temp = TempDir::new().unwrap();
            let interpreter = stub(temp.path());
            let params = ParameterSequence::from_values([
                "Build",
                "C:\\work\\proj",
                "$HOME",
                "a \"b\"",
                "my dir/x",
                "it's",
            ]);
            let env = environment("ok");
            let inv = Invocation {
                interpreter,
                runner: temp.path().join("runner.ps1"),
                parameters: &params,
                working_dir: temp.path().to_path_buf(),
                environment: &env,
                strategy: LaunchStrategy::CommandLine,
            };

            let mut out = Vec::new();
            let mut err = Vec::new();
            let result = launch(&inv, &OutputMasker::new(), &mut out, &mut err).unwrap();
            let out = String::from_utf8(out).unwrap();

            assert!(result.success);
            assert!(out.contains(
                "arg=Build\narg=C:\\work\\proj\narg=$HOME\narg=a \"b\"\narg=my dir/x\narg=it's\n"
            ));
        }

        #[test]
        fn killed_process_is_interrupted() {
            let (result, _, _) = run(LaunchStrategy::ArgumentList, "kill");
            assert!(matches!(result, Err(SqlCiError::Interrupted { .. })));
        }

        #[test]
        fn missing_interpreter_is_process_io() {
            let params = sequence();
            let env = EnvironmentSet::new();
            let inv = invocation(&params, &env, "/nonexistent/pwsh");
            let inv = Invocation {
                working_dir: std::env::temp_dir(),
                ..inv
            };

            let mut out = Vec::new();
            let mut err = Vec::new();
            let result = launch(&inv, &OutputMasker::new(), &mut out, &mut err);

            let Err(SqlCiError::ProcessIo { command, .. }) = result else {
                panic!("expected ProcessIo");
            };
            assert!(command.contains("********"));
            assert!(!command.contains("pa55-w0rd"));
        }
    }
}
