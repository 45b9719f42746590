//! Dotenv-style environment files.
//!
//! A build can point at a file of `KEY=value` lines describing the
//! environment its runtime resolved (for example one written by an earlier
//! build stage). The file is read fresh on every invocation.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Parses environment files into a map of variables.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Exported: `export KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Empty: `KEY=`
/// - Comments and blank lines are skipped
///
/// A non-blank line without `=` is an error.
///
/// # Example
///
/// ```
/// use sqlci::environment::EnvFileParser;
///
/// let vars = EnvFileParser::parse("# build env\nexport JAVA_HOME=/opt/jdk\nLABEL=\"nightly build\"\n").unwrap();
/// assert_eq!(vars.get("JAVA_HOME").map(String::as_str), Some("/opt/jdk"));
/// assert_eq!(vars.get("LABEL").map(String::as_str), Some("nightly build"));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse file content into a map of variables.
    pub fn parse(content: &str) -> Result<HashMap<String, String>> {
        let mut vars = HashMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                bail!("line {}: expected KEY=value", number + 1);
            };

            let key = key.trim();
            if key.is_empty() {
                bail!("line {}: missing variable name", number + 1);
            }

            vars.insert(key.to_string(), Self::unquote(value.trim()).to_string());
        }

        Ok(vars)
    }

    /// Remove one pair of matching surrounding quotes.
    fn unquote(value: &str) -> &str {
        let bytes = value.as_bytes();
        if bytes.len() >= 2
            && (bytes[0] == b'"' || bytes[0] == b'\'')
            && bytes[bytes.len() - 1] == bytes[0]
        {
            &value[1..value.len() - 1]
        } else {
            value
        }
    }

    /// Read and parse a file.
    pub fn load(path: &Path) -> Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("cannot parse {}", path.display()))
    }
}
