//! Sources of the caller-resolved environment layer.
//!
//! The calling runtime may resolve an environment that differs from the
//! raw process environment. Resolving it can fail; the composer treats a
//! failure as "nothing to add" and carries on.

use std::collections::HashMap;
use std::path::PathBuf;

use super::env_file::EnvFileParser;
use crate::error::{Result, SqlCiError};

/// Produces the caller-resolved environment for one invocation.
pub trait EnvironmentResolver: Send + Sync {
    /// Name of this source, for diagnostics.
    fn name(&self) -> String;

    /// Resolve the variables. Called once per invocation.
    fn resolve(&self) -> Result<HashMap<String, String>>;
}

/// Variables of the current process, skipping non-UTF-8 entries.
///
/// Skipped entries still reach the runner, which inherits the process
/// environment before the composed set is applied.
pub fn process_environment() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Variables read from a dotenv-style file.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    /// Resolve from the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EnvironmentResolver for EnvFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn resolve(&self) -> Result<HashMap<String, String>> {
        EnvFileParser::load(&self.path).map_err(|e| SqlCiError::EnvironmentResolution {
            source_name: self.name(),
            message: format!("{:#}", e),
        })
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment(pub HashMap<String, String>);

impl EnvironmentResolver for StaticEnvironment {
    fn name(&self) -> String {
        "static environment".to_string()
    }

    fn resolve(&self) -> Result<HashMap<String, String>> {
        Ok(self.0.clone())
    }
}

/// No caller-resolved environment at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnvironment;

impl EnvironmentResolver for NoEnvironment {
    fn name(&self) -> String {
        "none".to_string()
    }

    fn resolve(&self) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}
