//! Publish step: push a package to a NuGet feed.

use serde::Deserialize;

use super::common::{package_file_name, package_version, ProductVersion, StepContext};
use super::parameters::ParameterSequence;
use super::TokenBuilder;
use crate::secrets::Secret;

/// Configuration of a publish step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublishStep {
    pub package_id: String,
    pub package_version: Option<String>,
    pub feed_url: String,
    pub api_key: Option<Secret>,
    #[serde(deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub product_version: ProductVersion,
}

impl TokenBuilder for PublishStep {
    fn parameters(&self, ctx: &StepContext) -> ParameterSequence {
        let version = package_version(self.package_version.as_deref(), ctx.build_number);

        let mut builder = ParameterSequence::builder()
            .arg("Publish")
            .pair("-package", package_file_name(&self.package_id, &version))
            .pair("-nugetFeedUrl", self.feed_url.as_str());

        if let Some(key) = self.api_key.as_ref().filter(|key| !key.is_empty()) {
            builder = builder.secret_pair("-nugetFeedApiKey", key.clone());
        }

        self.product_version.append_to(builder).build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.package_id.trim().is_empty() {
            errors.push("publish: package_id is required".to_string());
        }
        if self.feed_url.trim().is_empty() {
            errors.push("publish: feed_url is required".to_string());
        }
        errors
    }
}
