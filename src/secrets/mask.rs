//! Masking of secret values in streamed child output.
//!
//! The runner is started with `-Verbose` and may echo the parameters it
//! received. Every secret value passed to it is registered here so the
//! log sinks never see it.

use std::io::{self, Write};

use super::secret::MASK;

/// Replaces registered secret values in text.
///
/// # Example
///
/// ```
/// use sqlci::secrets::OutputMasker;
///
/// let mut masker = OutputMasker::new();
/// masker.add_secret("secret123");
///
/// let output = masker.mask("VERBOSE: password=secret123");
/// assert_eq!(output, "VERBOSE: password=********");
/// ```
#[derive(Debug, Clone)]
pub struct OutputMasker {
    /// Secret values, longest first so overlapping values mask fully.
    secrets: Vec<String>,
    /// The mask string to use.
    mask: String,
}

impl OutputMasker {
    /// Create a masker using the default mask string.
    pub fn new() -> Self {
        Self::with_mask(MASK)
    }

    /// Create a masker with a custom mask string.
    pub fn with_mask(mask: impl Into<String>) -> Self {
        Self {
            secrets: Vec::new(),
            mask: mask.into(),
        }
    }

    /// Register a secret value. Empty strings are ignored.
    pub fn add_secret(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() || self.secrets.contains(&value) {
            return;
        }
        let position = self
            .secrets
            .iter()
            .position(|existing| existing.len() < value.len())
            .unwrap_or(self.secrets.len());
        self.secrets.insert(position, value);
    }

    /// Register several secret values.
    pub fn add_secrets(&mut self, values: impl IntoIterator<Item = impl Into<String>>) {
        for value in values {
            self.add_secret(value);
        }
    }

    /// Mask any secret values in the given string.
    pub fn mask(&self, input: &str) -> String {
        let mut result = input.to_string();
        for secret in &self.secrets {
            result = result.replace(secret.as_str(), &self.mask);
        }
        result
    }

    /// Mask secret values in raw bytes.
    ///
    /// Bytes that are not valid UTF-8 pass through unchanged.
    pub fn mask_bytes(&self, input: &[u8]) -> Vec<u8> {
        let mut result = input.to_vec();
        for secret in &self.secrets {
            result = replace_bytes(&result, secret.as_bytes(), self.mask.as_bytes());
        }
        result
    }

    /// Get the number of registered secrets.
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }

    /// Wrap a writer so everything written through it is masked.
    pub fn writer<W: Write>(&self, inner: W) -> MaskingWriter<'_, W> {
        MaskingWriter {
            inner,
            masker: self,
            buffer: Vec::new(),
        }
    }
}

fn replace_bytes(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while !rest.is_empty() {
        if rest.starts_with(needle) {
            out.extend_from_slice(replacement);
            rest = &rest[needle.len()..];
        } else {
            out.push(rest[0]);
            rest = &rest[1..];
        }
    }
    out
}

impl Default for OutputMasker {
    fn default() -> Self {
        Self::new()
    }
}

/// A writer that masks secret values line by line.
///
/// Partial lines are held back until a newline arrives or the writer is
/// flushed, so a secret split across two writes is still masked.
pub struct MaskingWriter<'a, W: Write> {
    inner: W,
    masker: &'a OutputMasker,
    buffer: Vec<u8>,
}

impl<W: Write> Write for MaskingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let rest = self.buffer.split_off(newline_pos + 1);
            let line = std::mem::replace(&mut self.buffer, rest);
            self.inner.write_all(&self.masker.mask_bytes(&line))?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let masked = self.masker.mask_bytes(&self.buffer);
            self.inner.write_all(&masked)?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}
