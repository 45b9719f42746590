//! Configuration loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use sqlci::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(
//!     temp.path().join("sqlci.yml"),
//!     "steps:\n  - build:\n      package_id: MyDb\n",
//! )
//! .unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.steps[0].kind(), "build");
//! ```

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use loader::{
    load_config, load_config_file, load_config_value, load_merged_config, ConfigPaths,
    CONFIG_FILE, LOCAL_CONFIG_FILE,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{Settings, SqlCiConfig};
pub use validator::{validate, validate_config, ValidationError};
