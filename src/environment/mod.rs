//! Environment composition for the runner process.
//!
//! The child's variables are built in layers, each overriding the last:
//!
//! 1. The inherited process environment
//! 2. Build variables supplied by the caller
//! 3. The caller-resolved environment, from an [`EnvironmentResolver`]
//! 4. The integration marker, [`MARKER_VARIABLE`]

pub mod compose;
pub mod env_file;
pub mod resolver;

pub use compose::{compose_environment, EnvSource, EnvironmentSet, MARKER_VALUE, MARKER_VARIABLE};
pub use env_file::EnvFileParser;
pub use resolver::{
    process_environment, EnvFile, EnvironmentResolver, NoEnvironment, StaticEnvironment,
};
