//! Sync step: deploy a package to a target database.

use serde::Deserialize;

use super::common::{
    package_file_name, package_version, ServerAuth, StepContext, TransactionIsolationLevel,
};
use super::parameters::ParameterSequence;
use super::TokenBuilder;

/// Configuration of a sync step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncStep {
    pub package_id: String,
    pub package_version: Option<String>,
    pub server_name: String,
    pub database_name: String,
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub auth: ServerAuth,
    pub options: Option<String>,
    pub filter: Option<String>,
    pub transaction_isolation_level: Option<TransactionIsolationLevel>,
    /// Also write the deployment script to `<package>.<version>.sql`.
    pub update_script: bool,
}

impl TokenBuilder for SyncStep {
    fn parameters(&self, ctx: &StepContext) -> ParameterSequence {
        let version = package_version(self.package_version.as_deref(), ctx.build_number);

        let mut builder = ParameterSequence::builder()
            .arg("Sync")
            .pair("-package", package_file_name(&self.package_id, &version))
            .pair("-databaseServer", self.server_name.as_str())
            .pair("-databaseName", self.database_name.as_str());

        if let ServerAuth::SqlServer { username, password } = &self.auth {
            builder = builder
                .pair("-databaseUserName", username.as_str())
                .secret_pair("-databasePassword", password.clone());
        }

        builder = builder
            .pair_if_present("-Options", self.options.as_deref())
            .pair_if_present("-filter", self.filter.as_deref());

        if let Some(level) = self.transaction_isolation_level {
            builder = builder.pair("-transactionIsolationLevel", level.to_string());
        }

        if self.update_script {
            builder = builder.pair(
                "-scriptFile",
                format!("{}.{}.sql", self.package_id, version),
            );
        }

        builder.build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.package_id.trim().is_empty() {
            errors.push("sync: package_id is required".to_string());
        }
        if self.server_name.trim().is_empty() {
            errors.push("sync: server_name is required".to_string());
        }
        if self.database_name.trim().is_empty() {
            errors.push("sync: database_name is required".to_string());
        }
        errors
    }
}
