//! Layered composition of the child process environment.
//!
//! Layers, lowest priority first:
//! 1. Inherited process environment
//! 2. Build variables supplied by the caller
//! 3. Caller-resolved environment (see [`EnvironmentResolver`])
//! 4. The integration marker variable
//!
//! A later layer wins on a name collision.

use std::collections::{BTreeMap, HashMap};

use super::resolver::EnvironmentResolver;

/// Name of the variable that identifies this integration to the runner.
pub const MARKER_VARIABLE: &str = "REDGATE_FUR_ENVIRONMENT";

/// Value of [`MARKER_VARIABLE`].
pub const MARKER_VALUE: &str = "Jenkins Plugin";

/// Which layer supplied a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSource {
    Inherited,
    BuildVariables,
    Resolved,
    Marker,
}

impl std::fmt::Display for EnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnvSource::Inherited => "inherited",
            EnvSource::BuildVariables => "build variables",
            EnvSource::Resolved => "resolved environment",
            EnvSource::Marker => "marker",
        };
        write!(f, "{}", s)
    }
}

/// The variable set for one child process.
///
/// # Example
///
/// ```
/// use sqlci::environment::{EnvSource, EnvironmentSet};
///
/// let mut env = EnvironmentSet::new();
/// env.apply(EnvSource::Inherited, [("A".to_string(), "1".to_string())]);
/// env.apply(EnvSource::BuildVariables, [("A".to_string(), "2".to_string())]);
///
/// assert_eq!(env.get("A"), Some("2"));
/// assert_eq!(env.source_of("A"), Some(EnvSource::BuildVariables));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSet {
    vars: BTreeMap<String, (String, EnvSource)>,
}

impl EnvironmentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a layer on top of what is already there.
    pub fn apply<I>(&mut self, source: EnvSource, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            self.vars.insert(key, (value, source));
        }
    }

    /// Get the value of a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|(value, _)| value.as_str())
    }

    /// Get the layer a variable's value came from.
    pub fn source_of(&self, key: &str) -> Option<EnvSource> {
        self.vars.get(key).map(|(_, source)| *source)
    }

    /// Iterate over name/value pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .map(|(key, (value, _))| (key.as_str(), value.as_str()))
    }

    /// Variables supplied on top of the inherited process environment.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter(|(_, (_, source))| *source != EnvSource::Inherited)
            .map(|(key, (value, _))| (key.as_str(), value.as_str()))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Compose the child environment from its layers.
///
/// A failure to resolve the caller's environment is logged and the layer
/// is skipped; it never aborts the invocation.
pub fn compose_environment(
    inherited: &HashMap<String, String>,
    build_variables: &HashMap<String, String>,
    resolver: &dyn EnvironmentResolver,
) -> EnvironmentSet {
    let mut env = EnvironmentSet::new();
    env.apply(EnvSource::Inherited, inherited.clone());
    env.apply(EnvSource::BuildVariables, build_variables.clone());

    match resolver.resolve() {
        Ok(resolved) => env.apply(EnvSource::Resolved, resolved),
        Err(e) => {
            tracing::debug!("Ignoring environment from {}: {}", resolver.name(), e);
        }
    }

    env.apply(
        EnvSource::Marker,
        [(MARKER_VARIABLE.to_string(), MARKER_VALUE.to_string())],
    );

    tracing::debug!("Composed environment with {} variables", env.len());
    env
}
