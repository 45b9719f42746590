//! Configuration schema for `sqlci.yml`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::resources::RunnerSource;
use crate::shell::LaunchStrategy;
use crate::steps::StepConfig;

/// Root configuration structure.
///
/// # Example
///
/// ```yaml
/// settings:
///   interpreter: /usr/bin/pwsh
///   runner: bundled
///   launch: argument-list
///   env_file: build.env
///   variables:
///     DEPLOY_TARGET: staging
///
/// steps:
///   - build:
///       package_id: MyDb
///       source:
///         subfolder: db/src
///   - publish:
///       package_id: MyDb
///       feed_url: https://nuget.example/api/v2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqlCiConfig {
    /// How the runner is located and started.
    pub settings: Settings,

    /// Steps in the order `sqlci run` executes them.
    #[serde(deserialize_with = "serde_yaml::with::singleton_map_recursive::deserialize")]
    pub steps: Vec<StepConfig>,
}

/// Settings shared by every step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interpreter executable. Falls back to `PS_HOME`, then the Windows
    /// PowerShell default.
    pub interpreter: Option<PathBuf>,

    /// Where the runner script comes from.
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub runner: RunnerSource,

    /// How the command reaches the operating system.
    pub launch: LaunchStrategy,

    /// File describing the caller-resolved environment, relative to the
    /// workspace.
    pub env_file: Option<PathBuf>,

    /// Build variables passed to the runner.
    pub variables: HashMap<String, String>,

    /// Extra variable names whose values are masked in output.
    pub secret_variables: Vec<String>,
}
