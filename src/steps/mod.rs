//! Build steps and the parameter tokens they hand to the runner.
//!
//! Each step type is a small, stateless token builder:
//!
//! - [`BuildStep`] - Package a database from source control
//! - [`TestStep`] - Run tSQLt tests against a temporary database
//! - [`SyncStep`] - Deploy a package to a target database
//! - [`PublishStep`] - Push a package to a NuGet feed
//!
//! All of them produce a [`ParameterSequence`] that the invocation
//! façade passes to the runner unchanged.
//!
//! # Example
//!
//! ```
//! use sqlci::steps::{PublishStep, StepContext, TokenBuilder};
//!
//! let step = PublishStep {
//!     package_id: "MyDb".into(),
//!     feed_url: "https://feed".into(),
//!     ..Default::default()
//! };
//! let params = step.parameters(&StepContext::new("/work", 7));
//! assert_eq!(params.values()[2], "MyDb.1.0.7.nupkg");
//! ```

pub mod build;
pub mod common;
pub mod parameters;
pub mod publish;
pub mod sync;
pub mod tsqlt;

use serde::Deserialize;

pub use build::{BuildStep, DbFolder, DlmDashboard};
pub use common::{
    escaped_options, package_file_name, package_version, ProductVersion, ServerAuth,
    StepContext, TemporaryDatabase, TransactionIsolationLevel,
};
pub use parameters::{ParameterSequence, ParameterSequenceBuilder, Token};
pub use publish::PublishStep;
pub use sync::SyncStep;
pub use tsqlt::{TestSource, TestStep};

/// Turns a step's configuration into runner parameters.
pub trait TokenBuilder {
    /// Build the ordered parameter tokens for this step.
    fn parameters(&self, ctx: &StepContext) -> ParameterSequence;

    /// Describe every problem with the configuration; empty when valid.
    fn validate(&self) -> Vec<String>;
}

/// One configured step, as it appears in the `steps:` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepConfig {
    Build(BuildStep),
    Test(TestStep),
    Sync(SyncStep),
    Publish(PublishStep),
}

impl StepConfig {
    /// Short name of the step type.
    pub fn kind(&self) -> &'static str {
        match self {
            StepConfig::Build(_) => "build",
            StepConfig::Test(_) => "test",
            StepConfig::Sync(_) => "sync",
            StepConfig::Publish(_) => "publish",
        }
    }

    fn builder(&self) -> &dyn TokenBuilder {
        match self {
            StepConfig::Build(step) => step,
            StepConfig::Test(step) => step,
            StepConfig::Sync(step) => step,
            StepConfig::Publish(step) => step,
        }
    }
}

impl TokenBuilder for StepConfig {
    fn parameters(&self, ctx: &StepContext) -> ParameterSequence {
        self.builder().parameters(ctx)
    }

    fn validate(&self) -> Vec<String> {
        self.builder().validate()
    }
}
