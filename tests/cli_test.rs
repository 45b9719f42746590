//! Integration tests for the sqlci binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_workspace(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("sqlci.yml"), config).unwrap();
    temp
}

fn sqlci(workspace: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("sqlci"));
    cmd.arg("--workspace")
        .arg(workspace.path())
        .arg("--build-number")
        .arg("12")
        .env_remove("SQLCI_DATABASE_PASSWORD")
        .env_remove("SQLCI_NUGET_API_KEY")
        .env_remove("SQLCI_TEMP_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

const PIPELINE_CONFIG: &str = r#"
steps:
  - build:
      package_id: MyDb
      source:
        subfolder: Database
  - sync:
      package_id: MyDb
      server_name: db1
      database_name: Staging
      auth:
        sql_server:
          username: deploy
          password: s3cr3t-pw
"#;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sqlci"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Build, test, sync and publish"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sqlci"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_a_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sqlci"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn dry_run_publish_masks_api_key() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = sqlci(&temp);
    cmd.args([
        "--dry-run",
        "publish",
        "--package-id",
        "MyDb",
        "--feed-url",
        "https://nuget.example/api/v2",
        "--api-key",
        "k3y-value",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Publish -package MyDb.1.0.12.nupkg -nugetFeedUrl https://nuget.example/api/v2",
        ))
        .stdout(predicate::str::contains("-nugetFeedApiKey ********"))
        .stdout(predicate::str::contains("k3y-value").not());
    Ok(())
}

#[test]
fn dry_run_does_not_stage_resources() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = sqlci(&temp);
    cmd.args(["--dry-run", "sync", "--package-id", "MyDb", "--server", "db1", "--database", "Prod"]);
    cmd.assert().success();

    assert!(!temp.path().join("PowerShell").exists());
    Ok(())
}

#[test]
fn api_key_can_come_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = sqlci(&temp);
    cmd.env("SQLCI_NUGET_API_KEY", "from-env-key").args([
        "--dry-run",
        "publish",
        "--package-id",
        "MyDb",
        "--feed-url",
        "https://feed",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("-nugetFeedApiKey ********"))
        .stdout(predicate::str::contains("from-env-key").not());
    Ok(())
}

#[test]
fn run_without_config_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = sqlci(&temp);
    cmd.arg("run");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

#[test]
fn invalid_config_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_workspace("steps:\n  - publish:\n      package_id: MyDb\n");
    let mut cmd = sqlci(&temp);
    cmd.arg("run");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("feed_url is required"));
    Ok(())
}

#[test]
fn malformed_config_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_workspace("steps: [unclosed\n");
    let mut cmd = sqlci(&temp);
    cmd.arg("show");
    cmd.assert().code(2);
    Ok(())
}

#[test]
fn show_lists_configured_steps() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_workspace(PIPELINE_CONFIG);
    let mut cmd = sqlci(&temp);
    cmd.arg("show");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("# 1. build"))
        .stdout(predicate::str::contains("# 2. sync"))
        .stdout(predicate::str::contains("-databasePassword ********"))
        .stdout(predicate::str::contains("s3cr3t-pw").not());
    Ok(())
}

#[test]
fn show_json_is_parseable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_workspace(PIPELINE_CONFIG);
    let mut cmd = sqlci(&temp);
    cmd.args(["show", "--json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let shown: serde_json::Value = serde_json::from_slice(&output)?;
    let steps = shown.as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["kind"], "build");
    assert_eq!(steps[1]["index"], 1);
    assert!(steps[1]["command_line"]
        .as_str()
        .unwrap()
        .contains("-package MyDb.1.0.12.nupkg"));
    Ok(())
}

#[cfg(unix)]
mod with_stub_interpreter {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    const STUB: &str = r#"#!/bin/sh
for arg in "$@"; do
  printf 'arg=%s\n' "$arg"
done
echo "marker=$REDGATE_FUR_ENVIRONMENT"
printf 'legacy=%s\n' "$LEGACY_VAR"
if [ "$STUB_MODE" = "fail" ]; then
  echo "runner failed" >&2
  exit 4
fi
exit 0
"#;

    fn stub(dir: &Path) -> PathBuf {
        let path = dir.join("stub-pwsh");
        fs::write(&path, STUB).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn sync_runs_the_runner_with_masked_output() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let interpreter = stub(temp.path());
        let mut cmd = sqlci(&temp);
        cmd.arg("--interpreter").arg(&interpreter).args([
            "sync",
            "--package-id",
            "MyDb",
            "--server",
            "db1",
            "--database",
            "Prod",
            "--username",
            "sa",
            "--password",
            "pa55-w0rd",
        ]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("arg=-NonInteractive"))
            .stdout(predicate::str::contains("arg=Sync"))
            .stdout(predicate::str::contains("arg=********"))
            .stdout(predicate::str::contains("marker=Jenkins Plugin"))
            .stdout(predicate::str::contains("pa55-w0rd").not());

        assert!(temp
            .path()
            .join("PowerShell")
            .join("SqlChangeAutomationRunner.ps1")
            .is_file());
        Ok(())
    }

    #[test]
    fn inherited_working_directory_stays_visible() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let interpreter = stub(temp.path());
        let runner = temp
            .path()
            .join("PowerShell")
            .join("SqlChangeAutomationRunner.ps1");
        let mut cmd = sqlci(&temp);
        cmd.env("PWD", temp.path())
            .env("OLDPWD", temp.path())
            .arg("--interpreter")
            .arg(&interpreter)
            .args(["publish", "--package-id", "MyDb", "--feed-url", "https://feed"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains(format!("arg={}", runner.display())))
            .stdout(predicate::str::contains("********/PowerShell").not());
        Ok(())
    }

    #[test]
    fn non_utf8_inherited_variable_reaches_the_runner() -> Result<(), Box<dyn std::error::Error>> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new()?;
        let interpreter = stub(temp.path());
        let mut cmd = sqlci(&temp);
        cmd.env("LEGACY_VAR", OsStr::from_bytes(b"caf\xe9"))
            .arg("--interpreter")
            .arg(&interpreter)
            .args(["publish", "--package-id", "MyDb", "--feed-url", "https://feed"]);
        let output = cmd.assert().success().get_output().stdout.clone();

        let expected: &[u8] = b"legacy=caf\xe9\n";
        assert!(output.windows(expected.len()).any(|w| w == expected));
        Ok(())
    }

    #[test]
    fn runner_failure_exits_with_one() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let interpreter = stub(temp.path());
        let mut cmd = sqlci(&temp);
        cmd.arg("--interpreter")
            .arg(&interpreter)
            .args(["--var", "STUB_MODE=fail"])
            .args(["publish", "--package-id", "MyDb", "--feed-url", "https://feed"]);
        cmd.assert()
            .code(1)
            .stderr(predicate::str::contains("runner failed"));
        Ok(())
    }

    #[test]
    fn run_stops_at_first_failure() -> Result<(), Box<dyn std::error::Error>> {
        let temp = setup_workspace(PIPELINE_CONFIG);
        let interpreter = stub(temp.path());
        let mut cmd = sqlci(&temp);
        cmd.arg("--interpreter")
            .arg(&interpreter)
            .args(["--var", "STUB_MODE=fail", "run"]);
        cmd.assert()
            .code(1)
            .stdout(predicate::str::contains("arg=Build"))
            .stdout(predicate::str::contains("arg=Sync").not())
            .stderr(predicate::str::contains("1 not run"));
        Ok(())
    }

    #[test]
    fn missing_runner_reports_error() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let interpreter = stub(temp.path());
        let mut cmd = sqlci(&temp);
        cmd.arg("--interpreter")
            .arg(&interpreter)
            .args(["--runner", "nowhere/runner.ps1"])
            .args(["publish", "--package-id", "MyDb", "--feed-url", "https://feed"]);
        cmd.assert()
            .code(1)
            .stderr(predicate::str::contains("ERROR:"))
            .stderr(predicate::str::contains("cannot be found"));
        Ok(())
    }
}
