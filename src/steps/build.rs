//! Build step: package a database from source control.

use serde::Deserialize;
use std::path::PathBuf;

use super::common::{
    escaped_options, package_version, ProductVersion, StepContext, TemporaryDatabase,
    TransactionIsolationLevel,
};
use super::parameters::ParameterSequence;
use super::TokenBuilder;

/// Where the database source lives in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbFolder {
    /// The checkout root itself.
    #[default]
    VcsRoot,
    /// A folder below the checkout root.
    Subfolder(PathBuf),
    /// A SQL Change Automation project file.
    Project(PathBuf),
}

/// DLM Dashboard endpoint to report the built schema to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DlmDashboard {
    pub host: String,
    pub port: String,
}

/// Configuration of a build step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildStep {
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub source: DbFolder,
    pub package_id: String,
    pub package_version: Option<String>,
    pub options: Option<String>,
    pub transaction_isolation_level: Option<TransactionIsolationLevel>,
    pub filter: Option<String>,
    pub temp_server: Option<TemporaryDatabase>,
    pub dlm_dashboard: Option<DlmDashboard>,
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub product_version: ProductVersion,
}

impl BuildStep {
    fn scripts_folder(&self, ctx: &StepContext) -> String {
        match &self.source {
            DbFolder::VcsRoot => ctx.workspace.display().to_string(),
            DbFolder::Subfolder(path) | DbFolder::Project(path) => ctx.workspace_path(path),
        }
    }
}

impl TokenBuilder for BuildStep {
    fn parameters(&self, ctx: &StepContext) -> ParameterSequence {
        let options = self.options.as_deref().map(escaped_options);

        let mut builder = ParameterSequence::builder()
            .arg("Build")
            .pair("-scriptsFolder", self.scripts_folder(ctx))
            .pair("-packageId", self.package_id.as_str())
            .pair(
                "-packageVersion",
                package_version(self.package_version.as_deref(), ctx.build_number),
            )
            .pair_if_present("-Options", options.as_deref());

        if let Some(level) = self.transaction_isolation_level {
            builder = builder.pair("-TransactionIsolationLevel", level.to_string());
        }

        builder = builder.pair_if_present("-filter", self.filter.as_deref());

        if let Some(server) = &self.temp_server {
            builder = server.append_to(builder, false);
        }

        if let Some(dashboard) = &self.dlm_dashboard {
            builder = builder
                .pair("-dlmDashboardHost", dashboard.host.as_str())
                .pair("-dlmDashboardPort", dashboard.port.as_str());
        }

        self.product_version.append_to(builder).build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.package_id.trim().is_empty() {
            errors.push("build: package_id is required".to_string());
        }
        if let Some(server) = &self.temp_server {
            if server.server_name.trim().is_empty() {
                errors.push("build: temp_server.server_name is required".to_string());
            }
        }
        errors
    }
}
