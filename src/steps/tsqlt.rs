//! Test step: run tSQLt tests against a temporary database.

use serde::Deserialize;
use std::path::PathBuf;

use super::common::{
    package_file_name, package_version, ProductVersion, StepContext, TemporaryDatabase,
};
use super::parameters::ParameterSequence;
use super::TokenBuilder;

/// What the tests run against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSource {
    /// A package produced by an earlier build step.
    #[default]
    Package,
    /// A SQL Change Automation project file in the workspace.
    Project(PathBuf),
}

/// Configuration of a test step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestStep {
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub source: TestSource,
    pub package_id: String,
    pub package_version: Option<String>,
    pub temp_server: Option<TemporaryDatabase>,
    /// Run only this test or test class.
    pub run_only: Option<String>,
    /// Path to a SQL Data Generator project.
    pub sql_data_generator: Option<String>,
    pub options: Option<String>,
    pub data_options: Option<String>,
    pub filter: Option<String>,
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub product_version: ProductVersion,
}

impl TokenBuilder for TestStep {
    fn parameters(&self, ctx: &StepContext) -> ParameterSequence {
        let package = match &self.source {
            TestSource::Project(path) => ctx.workspace_path(path),
            TestSource::Package => package_file_name(
                &self.package_id,
                &package_version(self.package_version.as_deref(), ctx.build_number),
            ),
        };

        let mut builder = ParameterSequence::builder()
            .arg("Test")
            .pair("-package", package);

        if let Some(server) = &self.temp_server {
            builder = server.append_to(builder, true);
        }

        builder = builder
            .pair_if_present("-runOnly", self.run_only.as_deref())
            .pair_if_present("-sqlDataGenerator", self.sql_data_generator.as_deref())
            .pair_if_present("-Options", self.options.as_deref())
            .pair_if_present("-DataOptions", self.data_options.as_deref())
            .pair_if_present("-filter", self.filter.as_deref());

        self.product_version.append_to(builder).build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.source == TestSource::Package && self.package_id.trim().is_empty() {
            errors.push("test: package_id is required when testing a package".to_string());
        }
        if let Some(server) = &self.temp_server {
            if server.server_name.trim().is_empty() {
                errors.push("test: temp_server.server_name is required".to_string());
            }
        }
        errors
    }
}
