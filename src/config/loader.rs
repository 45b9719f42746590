//! Configuration file discovery and loading.
//!
//! A workspace holds `sqlci.yml` and, optionally, an uncommitted
//! `sqlci.local.yml` that is deep-merged on top of it.

use crate::config::merger::merge_configs;
use crate::config::schema::SqlCiConfig;
use crate::error::{Result, SqlCiError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the workspace configuration file.
pub const CONFIG_FILE: &str = "sqlci.yml";

/// Name of the local override file.
pub const LOCAL_CONFIG_FILE: &str = "sqlci.local.yml";

/// Configuration files found in a workspace, in merge order.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Workspace config: sqlci.yml
    pub project: Option<PathBuf>,

    /// Local overrides: sqlci.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files in the given workspace.
    pub fn discover(workspace: &Path) -> Self {
        let existing = |name: &str| Some(workspace.join(name)).filter(|path| path.is_file());
        Self {
            project: existing(CONFIG_FILE),
            project_local: existing(LOCAL_CONFIG_FILE),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }
}

/// Load a config file as a raw YAML value, ready for merging.
///
/// An empty file loads as an empty mapping.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SqlCiError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SqlCiError::Io(e)
        }
    })?;

    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| SqlCiError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(if value.is_null() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        value
    })
}

fn from_value(value: serde_yaml::Value, path: &Path) -> Result<SqlCiConfig> {
    serde_yaml::from_value(value).map_err(|e| SqlCiError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<SqlCiConfig> {
    from_value(load_config_value(path)?, path)
}

/// Load `sqlci.yml` with `sqlci.local.yml` merged on top.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the workspace has no `sqlci.yml`.
pub fn load_merged_config(workspace: &Path) -> Result<SqlCiConfig> {
    let paths = ConfigPaths::discover(workspace);
    let Some(project) = &paths.project else {
        return Err(SqlCiError::ConfigNotFound {
            path: workspace.join(CONFIG_FILE),
        });
    };

    let configs = paths
        .all_existing()
        .into_iter()
        .map(|path| load_config_value(path))
        .collect::<Result<Vec<_>>>()?;

    from_value(merge_configs(&configs), project)
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
pub fn load_config(workspace: &Path, config_override: Option<&Path>) -> Result<SqlCiConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(workspace),
    }
}
