//! The two record serializations and the traits the pipeline uses for them.
//!
//! | Format | Reader | Encoder | Extensions |
//! |--------|--------|---------|------------|
//! | Aleph sequential | [`AlephSequentialReader`](crate::AlephSequentialReader) | [`AlephSequentialEncoder`](crate::AlephSequentialEncoder) | `.seq`, `.aleph` |
//! | ISO 2709 | [`MarcReader`](crate::MarcReader) | [`Iso2709Encoder`](crate::Iso2709Encoder) | `.mrc`, `.marc` |

mod traits;

pub use traits::{FormatReader, FormatReaderExt, RecordEncoder, RecordIterator};

use std::path::Path;

/// Supported format types for format detection and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    /// Aleph sequential text (`.seq`)
    AlephSequential,
    /// ISO 2709 binary MARC format (`.mrc`, `.marc`)
    Iso2709,
}

impl Format {
    /// Detect format from file extension, ignoring case.
    ///
    /// Returns `None` if the extension is not recognized.
    ///
    /// # Example
    ///
    /// ```
    /// use alephmarc::formats::Format;
    ///
    /// assert_eq!(Format::from_extension("mrc"), Some(Format::Iso2709));
    /// assert_eq!(Format::from_extension("seq"), Some(Format::AlephSequential));
    /// assert_eq!(Format::from_extension("unknown"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mrc" | "marc" => Some(Self::Iso2709),
            "seq" | "aleph" => Some(Self::AlephSequential),
            _ => None,
        }
    }

    /// Detect format from the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(std::ffi::OsStr::to_str)
            .and_then(Self::from_extension)
    }

    /// Get the human-readable name for this format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AlephSequential => "Aleph sequential",
            Self::Iso2709 => "ISO 2709",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
