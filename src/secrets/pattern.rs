//! Secret variable name matching.
//!
//! Build variables are plain name/value pairs. When a name looks like it
//! holds a credential, its value is masked in the child's output just like
//! a password parameter.

use regex::Regex;

/// Built-in patterns for variable names that hold secrets.
///
/// Each tuple contains (name, regex_pattern).
pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("api_key", r"(?i)^.*_?(API_?KEY|APIKEY)$"),
    ("secret", r"(?i)^.*_?(SECRET|SECRET_KEY)$"),
    ("token", r"(?i)^.*_?(TOKEN|ACCESS_TOKEN|AUTH_TOKEN)$"),
    ("password", r"(?i)^.*_?(PASSWORD|PASSWD|PWD)$"),
    ("connection_string", r"(?i)^.*CONNECTION_?STRING$"),
];

/// A named regex that identifies secret variable names.
#[derive(Debug, Clone)]
pub struct SecretPattern {
    /// Name of this pattern (for debugging).
    pub name: String,
    /// Regex matched against variable names.
    pub name_pattern: Regex,
}

/// Matches variable names against secret patterns.
///
/// # Example
///
/// ```
/// use sqlci::secrets::SecretMatcher;
///
/// let matcher = SecretMatcher::with_builtins();
/// assert!(matcher.is_secret("SQL_PASSWORD"));
/// assert!(matcher.is_secret("NUGET_API_KEY"));
/// assert!(!matcher.is_secret("BUILD_NUMBER"));
/// ```
#[derive(Debug, Clone)]
pub struct SecretMatcher {
    patterns: Vec<SecretPattern>,
}

impl SecretMatcher {
    /// Create a matcher with built-in patterns.
    pub fn with_builtins() -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .filter_map(|(name, pattern)| {
                Regex::new(pattern).ok().map(|name_pattern| SecretPattern {
                    name: name.to_string(),
                    name_pattern,
                })
            })
            .collect();

        Self { patterns }
    }

    /// Create a matcher from explicit patterns only.
    pub fn new(patterns: Vec<SecretPattern>) -> Self {
        Self { patterns }
    }

    /// Built-in patterns plus exact-match patterns for the given names.
    pub fn with_builtins_and_custom(custom_names: &[String]) -> Self {
        let mut matcher = Self::with_builtins();

        for name in custom_names {
            if let Ok(name_pattern) = Regex::new(&format!("^{}$", regex::escape(name))) {
                matcher.patterns.push(SecretPattern {
                    name: format!("custom:{}", name),
                    name_pattern,
                });
            }
        }

        matcher
    }

    /// Check whether a variable name matches any pattern.
    pub fn is_secret(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.name_pattern.is_match(name))
    }

    /// Values of all variables whose names look secret.
    pub fn secret_values<'a, I>(&self, vars: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        vars.into_iter()
            .filter(|(name, _)| self.is_secret(name))
            .map(|(_, value)| value)
            .collect()
    }
}

impl Default for SecretMatcher {
    fn default() -> Self {
        Self::with_builtins()
    }
}
