//! Output file holding pre-encoded records.
//!
//! [`OutputSink`] owns the destination file for the whole run. Records arrive
//! already encoded, so every call to [`OutputSink::write_encoded`] appends one
//! complete record. [`OutputSink::finish`] flushes and syncs the file; if the
//! sink is dropped without it (an upstream error unwound past it), `Drop`
//! still flushes what was written.

use crate::error::{MarcError, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Totals reported by [`OutputSink::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkStats {
    /// Records appended
    pub records_written: usize,
    /// Bytes appended
    pub bytes_written: u64,
}

/// Buffered, truncating output file.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    stats: SinkStats,
}

impl OutputSink {
    /// Create or truncate the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::OutputUnwritable`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| MarcError::OutputUnwritable {
            path: path.clone(),
            source,
        })?;
        debug!("opened output {}", path.display());

        Ok(OutputSink {
            path,
            writer: Some(BufWriter::new(file)),
            stats: SinkStats::default(),
        })
    }

    /// Path of the output file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Totals so far
    #[must_use]
    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Append one encoded record.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::IoError`] if the write fails.
    pub fn write_encoded(&mut self, record: &[u8]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(MarcError::InvalidState(format!(
                "output {} is already closed",
                self.path.display()
            )));
        };
        writer.write_all(record)?;
        self.stats.records_written += 1;
        self.stats.bytes_written += record.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes, sync the file to disk and close it.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::IoError`] if flushing or syncing fails. The file is
    /// closed either way.
    pub fn finish(mut self) -> Result<SinkStats> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        debug!(
            "closed output {} after {} records",
            self.path.display(),
            self.stats.records_written
        );
        Ok(self.stats)
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("failed to flush {}: {e}", self.path.display());
            }
        }
    }
}
