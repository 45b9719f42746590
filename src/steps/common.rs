//! Options shared by several build steps.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::parameters::ParameterSequenceBuilder;
use crate::secrets::Secret;

/// Per-build facts the token builders need.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The build's working directory (checkout root).
    pub workspace: PathBuf,
    /// The build number, used for default package versions.
    pub build_number: u64,
}

impl StepContext {
    /// Create a context for the given workspace and build number.
    pub fn new(workspace: impl Into<PathBuf>, build_number: u64) -> Self {
        Self {
            workspace: workspace.into(),
            build_number,
        }
    }

    /// Resolve a path relative to the workspace, rendered for the runner.
    pub fn workspace_path(&self, relative: &Path) -> String {
        self.workspace.join(relative).display().to_string()
    }
}

/// The package version to use: the explicit one, or `1.0.<build number>`.
pub fn package_version(explicit: Option<&str>, build_number: u64) -> String {
    match explicit {
        Some(version) if !version.is_empty() => version.to_string(),
        _ => format!("1.0.{}", build_number),
    }
}

/// The NuGet package file produced for a package id and version.
///
/// # Example
///
/// ```
/// use sqlci::steps::package_file_name;
///
/// assert_eq!(package_file_name("MyDb", "1.0.5"), "MyDb.1.0.5.nupkg");
/// ```
pub fn package_file_name(package_id: &str, version: &str) -> String {
    format!("{}.{}.nupkg", package_id, version)
}

/// Prefix options that start with `-` with a comma.
///
/// The runner would otherwise read `-IgnoreComments` as a new parameter
/// name; the leading comma makes PowerShell treat it as an array value.
pub fn escaped_options(options: &str) -> String {
    if options.trim().starts_with('-') {
        format!(",{}", options)
    } else {
        options.to_string()
    }
}

/// Which SQL Change Automation release the runner should use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductVersion {
    /// Whatever is newest on the gallery.
    #[default]
    Latest,
    /// A pinned version.
    Specific(String),
}

impl ProductVersion {
    /// Parse a CLI value: `latest` (any case) or a version string.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("latest") {
            ProductVersion::Latest
        } else {
            ProductVersion::Specific(value.to_string())
        }
    }

    /// Append `-RequiredProductVersion <version>`.
    pub fn append_to(&self, builder: ParameterSequenceBuilder) -> ParameterSequenceBuilder {
        builder.pair("-RequiredProductVersion", self.to_string())
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductVersion::Latest => write!(f, "Latest"),
            ProductVersion::Specific(version) => write!(f, "{}", version),
        }
    }
}

/// Transaction isolation level for deployments.
///
/// Rendered by variant name, which is what the runner accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
pub enum TransactionIsolationLevel {
    Serializable,
    Snapshot,
    RepeatableRead,
    ReadCommitted,
    ReadUncommitted,
}

impl fmt::Display for TransactionIsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Serializable => "Serializable",
            Self::Snapshot => "Snapshot",
            Self::RepeatableRead => "RepeatableRead",
            Self::ReadCommitted => "ReadCommitted",
            Self::ReadUncommitted => "ReadUncommitted",
        };
        f.write_str(name)
    }
}

/// How to authenticate against SQL Server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuth {
    /// Integrated Windows authentication; no credentials passed.
    #[default]
    Windows,
    /// SQL Server authentication.
    SqlServer { username: String, password: Secret },
}

/// A SQL Server instance used for a temporary database.
///
/// When absent, the runner uses LocalDB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TemporaryDatabase {
    pub server_name: String,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_yaml::with::singleton_map::deserialize"
    )]
    pub auth: ServerAuth,
    #[serde(default)]
    pub encrypt_connection: bool,
    #[serde(default)]
    pub trust_server_certificate: bool,
}

impl TemporaryDatabase {
    /// Append the temporary server connection parameters.
    ///
    /// The encryption switches are only emitted when `with_encryption` is
    /// set, since only the test runner accepts them.
    pub fn append_to(
        &self,
        builder: ParameterSequenceBuilder,
        with_encryption: bool,
    ) -> ParameterSequenceBuilder {
        let mut builder = builder
            .pair("-temporaryDatabaseServer", self.server_name.as_str())
            .pair_if_present("-temporaryDatabaseName", self.database_name.as_deref());

        if let ServerAuth::SqlServer { username, password } = &self.auth {
            builder = builder
                .pair("-temporaryDatabaseUserName", username.as_str())
                .secret_pair("-temporaryDatabasePassword", password.clone());
        }

        if with_encryption {
            builder = builder
                .switch("-temporaryDatabaseEncryptConnection", self.encrypt_connection)
                .switch(
                    "-temporaryDatabaseTrustServerCertificate",
                    self.trust_server_certificate,
                );
        }

        builder
    }
}
