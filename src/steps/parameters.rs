//! Ordered parameter tokens handed to the runner.

use std::collections::BTreeSet;
use std::fmt;

use crate::secrets::{mark_sensitive_indices, render_masked, Secret};

/// One positional argument or flag for the runner.
#[derive(Clone, PartialEq, Eq)]
pub enum Token {
    /// An ordinary value, shown as-is in logs.
    Plain(String),
    /// A value that is always masked in logs.
    Secret(Secret),
}

impl Token {
    /// The real value, as passed to the child process.
    pub fn expose(&self) -> &str {
        match self {
            Token::Plain(value) => value,
            Token::Secret(secret) => secret.expose(),
        }
    }

    /// Whether this token is an explicit secret.
    pub fn is_secret(&self) -> bool {
        matches!(self, Token::Secret(_))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Plain(value) => write!(f, "{:?}", value),
            Token::Secret(secret) => write!(f, "{:?}", secret),
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::Plain(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::Plain(value)
    }
}

impl From<Secret> for Token {
    fn from(value: Secret) -> Self {
        Token::Secret(value)
    }
}

/// An ordered, immutable sequence of runner parameters.
///
/// Built once through [`ParameterSequence::builder`] and never reordered.
///
/// # Example
///
/// ```
/// use sqlci::secrets::Secret;
/// use sqlci::steps::ParameterSequence;
///
/// let params = ParameterSequence::builder()
///     .arg("Publish")
///     .pair("-nugetFeedUrl", "https://feed/")
///     .secret_pair("-nugetFeedApiKey", Secret::new("k1"))
///     .build();
///
/// assert_eq!(params.values(), vec!["Publish", "-nugetFeedUrl", "https://feed/", "-nugetFeedApiKey", "k1"]);
/// assert_eq!(params.masked().join(" "), "Publish -nugetFeedUrl https://feed/ -nugetFeedApiKey ********");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ParameterSequence {
    tokens: Vec<Token>,
}

impl ParameterSequence {
    /// Start building a sequence.
    pub fn builder() -> ParameterSequenceBuilder {
        ParameterSequenceBuilder::default()
    }

    /// Build a sequence of plain tokens.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: values.into_iter().map(|v| Token::Plain(v.into())).collect(),
        }
    }

    /// The tokens in order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The real values in order, for execution.
    pub fn values(&self) -> Vec<&str> {
        self.tokens.iter().map(Token::expose).collect()
    }

    /// Indices of tokens that must not appear in logs.
    ///
    /// Union of explicit secret tokens and values that follow a sensitive
    /// flag.
    pub fn sensitive_indices(&self) -> BTreeSet<usize> {
        let mut indices = mark_sensitive_indices(&self.values());
        indices.extend(
            self.tokens
                .iter()
                .enumerate()
                .filter(|(_, token)| token.is_secret())
                .map(|(index, _)| index),
        );
        indices
    }

    /// Real values of every sensitive token.
    pub fn sensitive_values(&self) -> Vec<&str> {
        let values = self.values();
        self.sensitive_indices()
            .into_iter()
            .map(|index| values[index])
            .collect()
    }

    /// The tokens rendered for display, sensitive ones masked.
    pub fn masked(&self) -> Vec<String> {
        render_masked(&self.values(), &self.sensitive_indices())
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the sequence has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Debug for ParameterSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.masked()).finish()
    }
}

/// Accumulates tokens for a [`ParameterSequence`].
#[derive(Debug, Default)]
pub struct ParameterSequenceBuilder {
    tokens: Vec<Token>,
}

impl ParameterSequenceBuilder {
    /// Append one token.
    pub fn arg(mut self, token: impl Into<Token>) -> Self {
        self.tokens.push(token.into());
        self
    }

    /// Append a flag followed by its value.
    pub fn pair(self, flag: &str, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.arg(flag).arg(value)
    }

    /// Append a flag followed by a secret value.
    pub fn secret_pair(self, flag: &str, value: Secret) -> Self {
        self.arg(flag).arg(value)
    }

    /// Append a flag and value only when the value is non-empty.
    pub fn pair_if_present(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => self.pair(flag, value),
            _ => self,
        }
    }

    /// Append a bare switch when `enabled`.
    pub fn switch(self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.arg(flag)
        } else {
            self
        }
    }

    /// Freeze the sequence.
    pub fn build(self) -> ParameterSequence {
        ParameterSequence {
            tokens: self.tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MASK;

    #[test]
    fn order_is_preserved() {
        let params = ParameterSequence::from_values(["b", "a", "c"]);
        assert_eq!(params.values(), vec!["b", "a", "c"]);
    }

    #[test]
    fn flag_derived_values_are_masked() {
        let params = ParameterSequence::from_values([
            "Build",
            "-temporaryDatabasePassword",
            "secret123",
        ]);
        assert_eq!(params.masked()[2], MASK);
        assert_eq!(params.values()[2], "secret123");
    }

    #[test]
    fn explicit_secret_is_masked_without_a_flag() {
        let params = ParameterSequence::builder()
            .arg("-custom")
            .arg(Secret::new("hidden"))
            .build();
        assert_eq!(params.masked(), vec!["-custom".to_string(), MASK.to_string()]);
        assert_eq!(params.sensitive_values(), vec!["hidden"]);
    }

    #[test]
    fn pair_if_present_skips_empty_values() {
        let params = ParameterSequence::builder()
            .pair_if_present("-filter", Some(""))
            .pair_if_present("-Options", None)
            .pair_if_present("-DataOptions", Some("x"))
            .build();
        assert_eq!(params.values(), vec!["-DataOptions", "x"]);
    }

    #[test]
    fn switch_appends_only_when_enabled() {
        let params = ParameterSequence::builder()
            .switch("-a", true)
            .switch("-b", false)
            .build();
        assert_eq!(params.values(), vec!["-a"]);
    }

    #[test]
    fn debug_output_is_masked() {
        let params = ParameterSequence::builder()
            .secret_pair("-databasePassword", Secret::new("pw"))
            .build();
        let rendered = format!("{:?}", params);
        assert!(!rendered.contains("\"pw\""));
        assert!(rendered.contains(MASK));
    }

    #[test]
    fn empty_values_are_kept() {
        let params = ParameterSequence::from_values(["-filter", ""]);
        assert_eq!(params.len(), 2);
        assert!(!params.is_empty());
    }
}
