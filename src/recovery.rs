//! Policies for malformed Aleph sequential lines.
//!
//! A sequential export that went through hand editing or a lossy transfer can
//! carry lines that do not follow the `ID TAG IND L DATA` layout. The
//! [`RecoveryMode`] decides what the reader does with them: stop at the first
//! one (the default) or log a warning and drop the line.
//!
//! Charset and I/O failures are never recoverable; only
//! [`MarcError::ParseError`] goes through the policy.

use crate::error::{MarcError, Result};
use log::warn;

/// Strategy for handling malformed sequential lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Return the first parse error (default)
    #[default]
    Strict,
    /// Log each malformed line and skip it
    Lenient,
}

/// Tracks what a reader skipped under its recovery mode
#[derive(Debug, Default)]
pub struct RecoveryContext {
    /// Current recovery mode
    pub mode: RecoveryMode,
    skipped: usize,
}

impl RecoveryContext {
    /// Create a new recovery context with the given mode
    #[must_use]
    pub fn new(mode: RecoveryMode) -> Self {
        RecoveryContext {
            mode,
            skipped: 0,
        }
    }

    /// Number of lines skipped so far
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Apply the policy to an error.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged in strict mode, and for any error that is not
    /// a [`MarcError::ParseError`]. In lenient mode a parse error is logged,
    /// counted and swallowed.
    pub fn recover(&mut self, error: MarcError) -> Result<()> {
        match (self.mode, &error) {
            (RecoveryMode::Lenient, MarcError::ParseError { .. }) => {
                warn!("skipping malformed line: {error}");
                self.skipped += 1;
                Ok(())
            },
            _ => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_returns_error() {
        let mut context = RecoveryContext::new(RecoveryMode::Strict);
        let result = context.recover(MarcError::parse(3, "missing tag"));
        assert!(matches!(result, Err(MarcError::ParseError { line: 3, .. })));
        assert_eq!(context.skipped(), 0);
    }

    #[test]
    fn test_lenient_counts_skipped_lines() {
        let mut context = RecoveryContext::new(RecoveryMode::Lenient);
        for line in 1..=10_000 {
            context.recover(MarcError::parse(line, "missing tag")).unwrap();
        }
        assert_eq!(context.skipped(), 10_000);
    }

    #[test]
    fn test_lenient_does_not_swallow_encoding_errors() {
        let mut context = RecoveryContext::new(RecoveryMode::Lenient);
        let result = context.recover(MarcError::EncodingError("bad bytes".to_string()));
        assert!(matches!(result, Err(MarcError::EncodingError(_))));
    }

    #[test]
    fn test_default_is_strict() {
        assert_eq!(RecoveryMode::default(), RecoveryMode::Strict);
        assert_eq!(RecoveryContext::default().mode, RecoveryMode::Strict);
    }
}
