//! Text encoding of commit metadata and tree entry names
//!
//! Git stores names, identities and messages as raw bytes and records a non-UTF-8
//! commit encoding in an `encoding` header. Text that cannot be represented in the
//! requested encoding is rejected instead of being replaced.
//!
//! Labels resolve with WHATWG rules, and the commit records the canonical name rather
//! than the label given. `latin1` and `ISO-8859-1` both mean `windows-1252`, which
//! also maps 0x80-0x9f to characters such as `€`; the recorded header stays accurate
//! for the bytes written.

use crate::errors::ImportError;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    /// Resolve an encoding label such as `UTF-8`, `latin1` or `shift_jis`
    pub fn try_parse(label: &str) -> anyhow::Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| anyhow::anyhow!("unknown text encoding: {label}"))?;

        // UTF-16 and the replacement encoding decode fine but encode as UTF-8
        if encoding.output_encoding() != encoding {
            anyhow::bail!("text encoding {} cannot be used for writing", encoding.name());
        }

        Ok(Self(encoding))
    }

    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    pub fn is_utf8(&self) -> bool {
        self.0 == UTF_8
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Encode `text`, failing if any character has no representation
    ///
    /// `what` names the text in the error (e.g. "commit message").
    pub fn encode(&self, what: &str, text: &str) -> anyhow::Result<Bytes> {
        let (bytes, _, had_errors) = self.0.encode(text);
        if had_errors {
            return Err(ImportError::Unrepresentable {
                what: what.to_string(),
                encoding: self.name().to_string(),
            }
            .into());
        }

        Ok(Bytes::copy_from_slice(&bytes))
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _, _) = self.0.decode(bytes);
        text.into_owned()
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
