//! Secret handling: opaque values, parameter redaction, output masking.
//!
//! - [`Secret`] - Wrapper that never prints its value
//! - [`mark_sensitive_indices`] - Finds parameters that follow a sensitive flag
//! - [`OutputMasker`] - Masks secret values in the child's streamed output
//! - [`SecretMatcher`] - Recognizes build variables that hold secrets
//!
//! # Example
//!
//! ```
//! use sqlci::secrets::{mark_sensitive_indices, render_masked};
//!
//! let tokens = ["Publish", "-nugetFeedApiKey", "k1"];
//! let masked = mark_sensitive_indices(&tokens);
//! assert_eq!(render_masked(&tokens, &masked).join(" "), "Publish -nugetFeedApiKey ********");
//! ```

pub mod mask;
pub mod pattern;
pub mod redact;
pub mod secret;

pub use mask::{MaskingWriter, OutputMasker};
pub use pattern::{SecretMatcher, SecretPattern, BUILTIN_PATTERNS};
pub use redact::{
    has_dangling_sensitive_flag, is_sensitive_flag, mark_sensitive_indices, render_masked,
    SENSITIVE_FLAG_MARKERS,
};
pub use secret::{Secret, MASK};
