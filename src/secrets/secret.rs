//! Opaque wrapper for secret values.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Text shown in place of a secret value.
pub const MASK: &str = "********";

/// A secret string that never shows up in `Debug` or `Display` output.
///
/// The real value is only reachable through [`Secret::expose`], which is
/// called when handing the value to the child process.
///
/// # Example
///
/// ```
/// use sqlci::secrets::Secret;
///
/// let password = Secret::new("hunter2");
/// assert_eq!(password.to_string(), "********");
/// assert_eq!(format!("{:?}", password), "Secret(********)");
/// assert_eq!(password.expose(), "hunter2");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reveal the value for execution.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", MASK)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_debug_are_masked() {
        let secret = Secret::new("p@ss");
        assert!(!format!("{}", secret).contains("p@ss"));
        assert!(!format!("{:?}", secret).contains("p@ss"));
    }

    #[test]
    fn expose_returns_real_value() {
        assert_eq!(Secret::from("k1").expose(), "k1");
    }

    #[test]
    fn deserializes_from_plain_string() {
        #[derive(Deserialize)]
        struct Auth {
            password: Secret,
        }

        let auth: Auth = serde_yaml::from_str("password: s3cret").unwrap();
        assert_eq!(auth.password.expose(), "s3cret");
    }

    #[test]
    fn debug_of_containing_struct_hides_value() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Auth {
            user: String,
            password: Secret,
        }

        let auth = Auth {
            user: "sa".into(),
            password: Secret::new("topsecret"),
        };
        let rendered = format!("{:?}", auth);
        assert!(rendered.contains("sa"));
        assert!(!rendered.contains("topsecret"));
    }
}
