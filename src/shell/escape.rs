//! Escaping of tokens for a single flat command line.
//!
//! The flat command-line launch strategy hands one string to an
//! intermediate command interpreter, which re-parses it before the runner
//! script sees its parameters. Each token is escaped on its own so that
//! paths with spaces and option strings with embedded quotes survive that
//! extra round of parsing.

/// Replacement for an embedded double quote: three backslashes and a quote.
const ESCAPED_QUOTE: &str = "\\\\\\\"";

/// Escape a single token for inclusion in a flat command line.
///
/// Double quotes become `\\\"`; a token containing whitespace is then
/// wrapped in double quotes. Anything else is returned unchanged.
///
/// # Example
///
/// ```
/// use sqlci::shell::escape;
///
/// assert_eq!(escape("-packageId"), "-packageId");
/// assert_eq!(escape("C:\\My Work"), "\"C:\\My Work\"");
/// assert_eq!(escape("a\"b"), "a\\\\\\\"b");
/// ```
pub fn escape(token: &str) -> String {
    if is_safe(token) {
        return token.to_string();
    }

    let escaped = token.replace('"', ESCAPED_QUOTE);
    if escaped.chars().any(char::is_whitespace) {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

/// Check whether a token would come out of [`escape`] unchanged.
pub fn is_safe(token: &str) -> bool {
    !token.contains('"') && !token.chars().any(char::is_whitespace)
}

/// Compose a flat command line from a program and its arguments.
///
/// The program path is always quoted; every argument goes through
/// [`escape`].
pub fn compose_command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = format!("\"{}\"", program);
    for arg in args {
        line.push(' ');
        line.push_str(&escape(arg.as_ref()));
    }
    line
}

/// Characters a POSIX shell gives meaning to outside single quotes.
const SHELL_META: &[char] = &[
    ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
    '<', '>', '|', '&', ';', '#', '~',
];

/// Quote a single token for `/bin/sh -c`.
///
/// Tokens with shell metacharacters are wrapped in single quotes, so
/// backslashes and `$` reach the program unchanged. An embedded single
/// quote becomes `'\''`.
pub fn sh_quote(token: &str) -> String {
    if token.is_empty() {
        return "''".to_string();
    }
    if !token.contains(SHELL_META) {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', "'\\''"))
}

/// Compose a flat command line for a POSIX shell.
pub fn compose_sh_command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = sh_quote(program);
    for arg in args {
        line.push(' ');
        line.push_str(&sh_quote(arg.as_ref()));
    }
    line
}
