//! Format reader and encoder traits for MARC records.
//!
//! The conversion pipeline is written against these traits, so either
//! serialization can sit on either side of it.

use crate::error::Result;
use crate::record::Record;

/// Trait for readers that can produce MARC records from a source.
///
/// Implementations should:
/// - Return `Ok(None)` when the source is exhausted (not an error)
/// - Preserve field ordering and all record metadata exactly
/// - Decode text with the configured charset, never with silent replacement
pub trait FormatReader: std::fmt::Debug {
    /// Read the next record from the source.
    ///
    /// Returns:
    /// - `Ok(Some(record))` if a record was read successfully
    /// - `Ok(None)` if the end of the source was reached
    /// - `Err(_)` if reading failed due to malformed data or I/O errors
    ///
    /// # Errors
    ///
    /// Returns an error if the source contains malformed data or I/O fails.
    fn read_record(&mut self) -> Result<Option<Record>>;

    /// Returns the number of records read so far, if the reader tracks it.
    fn records_read(&self) -> Option<usize> {
        None
    }
}

impl<R: FormatReader + ?Sized> FormatReader for Box<R> {
    fn read_record(&mut self) -> Result<Option<Record>> {
        (**self).read_record()
    }

    fn records_read(&self) -> Option<usize> {
        (**self).records_read()
    }
}

/// Trait for turning one record into its serialized bytes.
///
/// Encoders are the unit of work in the conversion pipeline: a record is
/// encoded completely before any of its bytes reach the output, so a failed
/// encoding never leaves a partial record behind.
///
/// Encoders take `&mut self` because some formats number records as they go.
pub trait RecordEncoder: std::fmt::Debug {
    /// Encode a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be represented in the format.
    fn encode(&mut self, record: &Record) -> Result<Vec<u8>>;
}

impl<E: RecordEncoder + ?Sized> RecordEncoder for Box<E> {
    fn encode(&mut self, record: &Record) -> Result<Vec<u8>> {
        (**self).encode(record)
    }
}

/// Iterator-style access for format readers.
///
/// Implemented for every [`FormatReader`].
pub trait FormatReaderExt: FormatReader {
    /// Iterate over the remaining records.
    ///
    /// ```
    /// use alephmarc::{AlephSequentialReader, FormatReaderExt};
    /// use std::io::Cursor;
    ///
    /// let text = "000000001 001   L 1\n000000002 001   L 2\n";
    /// let mut reader = AlephSequentialReader::new(Cursor::new(text));
    /// assert_eq!(reader.records().count(), 2);
    /// ```
    fn records(&mut self) -> RecordIterator<'_, Self>
    where
        Self: Sized,
    {
        RecordIterator { reader: self }
    }
}

impl<T: FormatReader> FormatReaderExt for T {}

/// Iterator adapter for [`FormatReader`].
///
/// Created by the [`records`](FormatReaderExt::records) method.
#[derive(Debug)]
pub struct RecordIterator<'a, R: FormatReader> {
    reader: &'a mut R,
}

impl<R: FormatReader> Iterator for RecordIterator<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}
