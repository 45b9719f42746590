//! Redaction of secret-bearing parameters.
//!
//! Credentials reach the runner as ordinary positional values that follow
//! a flag such as `-temporaryDatabasePassword`. The real values must reach
//! the child process untouched, but any rendering of the command line for
//! logs masks them.

use std::collections::BTreeSet;

use super::secret::MASK;

/// Flag names whose following token carries a secret.
///
/// Matching is by substring, so `-temporaryDatabasePassword` and
/// `temporaryDatabasePassword:` are both recognized.
pub const SENSITIVE_FLAG_MARKERS: &[&str] = &[
    "temporaryDatabasePassword",
    "databasePassword",
    "nugetFeedApiKey",
];

/// Check whether a token is one of the sensitive flags.
pub fn is_sensitive_flag(token: &str) -> bool {
    SENSITIVE_FLAG_MARKERS
        .iter()
        .any(|marker| token.contains(marker))
}

/// Find the indices of tokens that must be masked.
///
/// The token right after a sensitive flag is marked, whatever it looks
/// like. If that token is itself a sensitive flag, the token after it is
/// marked as well.
///
/// # Example
///
/// ```
/// use sqlci::secrets::mark_sensitive_indices;
///
/// let tokens = ["Build", "-temporaryDatabasePassword", "secret123", "-filter", "f"];
/// let marked = mark_sensitive_indices(&tokens);
/// assert_eq!(marked.into_iter().collect::<Vec<_>>(), vec![2]);
/// ```
pub fn mark_sensitive_indices<S: AsRef<str>>(tokens: &[S]) -> BTreeSet<usize> {
    let mut marked = BTreeSet::new();
    let mut mask_next = false;

    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if mask_next {
            marked.insert(index);
        }
        mask_next = is_sensitive_flag(token);
    }

    marked
}

/// Check whether the last token is a sensitive flag with no value.
pub fn has_dangling_sensitive_flag<S: AsRef<str>>(tokens: &[S]) -> bool {
    tokens
        .last()
        .map(|token| is_sensitive_flag(token.as_ref()))
        .unwrap_or(false)
}

/// Render tokens for display, replacing marked indices with a mask.
pub fn render_masked<S: AsRef<str>>(tokens: &[S], masked: &BTreeSet<usize>) -> Vec<String> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            if masked.contains(&index) {
                MASK.to_string()
            } else {
                token.as_ref().to_string()
            }
        })
        .collect()
}
