//! Locating the runner script and staging its companion resources.
//!
//! The runner is found fresh for every invocation; nothing is cached.
//!
//! # Example
//!
//! ```
//! use sqlci::resources::{locate_runner, RunnerSource};
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let location = locate_runner(&RunnerSource::Bundled, temp.path()).unwrap();
//! assert!(location.runner.ends_with("PowerShell/SqlChangeAutomationRunner.ps1"));
//! ```

pub mod bundled;
pub mod installed;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SqlCiError};

/// Where the runner script comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerSource {
    /// Scripts embedded in this binary, written into the working directory.
    #[default]
    Bundled,
    /// A `sqlci.ps1` installed on the agent.
    Installed,
    /// An explicit script. Relative paths are resolved against the working
    /// directory.
    Path(PathBuf),
}

/// The resolved runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    /// Absolute path of the script the interpreter runs.
    pub runner: PathBuf,
    /// Files written into the working directory for this invocation.
    pub staged: Vec<PathBuf>,
}

/// Resolve the runner for one invocation, staging resources as needed.
pub fn locate_runner(source: &RunnerSource, working_dir: &Path) -> Result<ResourceLocation> {
    match source {
        RunnerSource::Bundled => {
            let staged = bundled::stage(working_dir)?;
            let runner = absolute(&working_dir.join(bundled::STAGING_DIR).join(bundled::RUNNER_SCRIPT));
            Ok(ResourceLocation { runner, staged })
        }
        RunnerSource::Installed => Ok(ResourceLocation {
            runner: installed::find()?,
            staged: Vec::new(),
        }),
        RunnerSource::Path(path) => {
            let runner = absolute(&working_dir.join(path));
            if !runner.is_file() {
                return Err(SqlCiError::ResourceNotFound {
                    resource: path.display().to_string(),
                    checked: vec![runner.display().to_string()],
                });
            }
            Ok(ResourceLocation {
                runner,
                staged: Vec::new(),
            })
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
