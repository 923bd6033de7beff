//! Error types for conversion operations.
//!
//! This module provides the [`MarcError`] type for all decoding, encoding and
//! pipeline operations, and the [`Result`] convenience type.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for all library operations.
///
/// Represents the error conditions that can occur while reading Aleph
/// sequential text, encoding ISO 2709 records, or moving records through
/// the conversion pipeline.
#[derive(Error, Debug)]
pub enum MarcError {
    /// The input path does not exist or cannot be opened for reading.
    #[error("Input not found: {}: {source}", path.display())]
    InputNotFound {
        /// Path that was requested
        path: PathBuf,
        /// Underlying open error
        #[source]
        source: std::io::Error,
    },

    /// The output path cannot be created or truncated.
    #[error("Output unwritable: {}: {source}", path.display())]
    OutputUnwritable {
        /// Path that was requested
        path: PathBuf,
        /// Underlying create error
        #[source]
        source: std::io::Error,
    },

    /// A malformed Aleph sequential line.
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number in the input
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A record that cannot be represented in ISO 2709 or in the chosen charset.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Error indicating an invalid leader (24-byte header).
    #[error("Invalid leader: {0}")]
    InvalidLeader(String),

    /// Error indicating an invalid or malformed binary record.
    #[error("Invalid MARC record: {0}")]
    InvalidRecord(String),

    /// Error indicating an invalid binary field structure.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Error indicating a truncated or incomplete binary record.
    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    /// Unknown charset label or an unsupported option combination.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Attempt to drive a pipeline that already reached a terminal state.
    #[error("Invalid pipeline state: {0}")]
    InvalidState(String),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MarcError {
    /// Build a [`MarcError::ParseError`] for the given line.
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        MarcError::ParseError {
            line,
            message: message.into(),
        }
    }
}

/// Convenience type alias for [`std::result::Result`] with [`MarcError`].
pub type Result<T> = std::result::Result<T, MarcError>;
