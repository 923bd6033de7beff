//! Character set support for sequential input and binary output.
//!
//! Aleph sequential exports are either UTF-8 or a single-byte legacy charset,
//! and ISO 2709 output is written in whatever charset the receiving system
//! expects. [`Charset`] wraps an [`encoding_rs::Encoding`] resolved from a
//! WHATWG label (`utf-8`, `iso-8859-1`, `windows-1252`, ...) and converts in
//! both directions without silent replacement: bytes that do not decode and
//! characters that cannot be encoded are reported as
//! [`MarcError::EncodingError`].

use crate::error::{MarcError, Result};
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::fmt;

/// A character set used to decode input text or encode output field data.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
}

impl Charset {
    /// UTF-8, the default for both directions.
    #[must_use]
    pub fn utf8() -> Self {
        Charset { encoding: UTF_8 }
    }

    /// Resolve a charset label for decoding input.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidConfig`] if the label is unknown or names a
    /// charset that is not ASCII-compatible.
    pub fn for_input(label: &str) -> Result<Self> {
        Self::resolve(label, "input")
    }

    /// Resolve a charset label for encoding output.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidConfig`] if the label is unknown or names a
    /// charset that is not ASCII-compatible.
    pub fn for_output(label: &str) -> Result<Self> {
        Self::resolve(label, "output")
    }

    // Line splitting and the ISO 2709 delimiters are single ASCII bytes, so
    // UTF-16, ISO-2022-JP and the replacement encoding are unusable.
    fn resolve(label: &str, direction: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            MarcError::InvalidConfig(format!("unknown {direction} charset '{label}'"))
        })?;
        if !encoding.is_ascii_compatible() {
            return Err(MarcError::InvalidConfig(format!(
                "charset '{}' cannot be used for {direction}",
                encoding.name()
            )));
        }
        Ok(Charset { encoding })
    }

    /// Canonical name of the charset
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Returns true for UTF-8
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        self.encoding == UTF_8
    }

    /// Decode bytes into text.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::EncodingError`] if the bytes are malformed for this charset.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or_else(|| {
                MarcError::EncodingError(format!("input is not valid {}", self.name()))
            })
    }

    /// Encode text into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::EncodingError`] if a character has no mapping in this charset.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        if self.is_utf8() {
            return Ok(Cow::Borrowed(text.as_bytes()));
        }
        let (bytes, _, had_unmappable) = self.encoding.encode(text);
        if had_unmappable {
            return Err(MarcError::EncodingError(format!(
                "value {text:?} is not representable in {}",
                self.name()
            )));
        }
        Ok(bytes)
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
