//! Reading MARC records from ISO 2709 binary streams.
//!
//! This module provides [`MarcReader`] for reading ISO 2709 formatted MARC records
//! from any source that implements [`std::io::Read`]. It is the inverse of
//! [`encode_record`](crate::writer::encode_record) and is used to verify
//! converter output and to convert binary files back to Aleph sequential text.
//!
//! # Examples
//!
//! ```no_run
//! use alephmarc::MarcReader;
//! use std::fs::File;
//!
//! let file = File::open("records.mrc")?;
//! let mut reader = MarcReader::new(file);
//!
//! while let Some(record) = reader.read_record()? {
//!     println!("Record type: {}", record.leader.record_type);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::encoding::Charset;
use crate::error::{MarcError, Result};
use crate::formats::FormatReader;
use crate::leader::{Leader, LEADER_LEN};
use crate::record::{is_control_tag, Field, Record};
use crate::writer::{FIELD_TERMINATOR, RECORD_TERMINATOR, SUBFIELD_DELIMITER};
use std::io::Read;

/// Reader for ISO 2709 binary MARC format.
///
/// `MarcReader` reads one MARC record at a time from any source implementing
/// [`std::io::Read`]. Fields are returned in directory order.
#[derive(Debug)]
pub struct MarcReader<R: Read> {
    reader: R,
    charset: Charset,
    records_read: usize,
}

impl<R: Read> MarcReader<R> {
    /// Create a new MARC reader decoding field data as UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use alephmarc::MarcReader;
    /// use std::io::Cursor;
    ///
    /// let reader = MarcReader::new(Cursor::new(Vec::new()));
    /// ```
    pub fn new(reader: R) -> Self {
        MarcReader {
            reader,
            charset: Charset::utf8(),
            records_read: 0,
        }
    }

    /// Set the charset used to decode field data.
    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Read a single MARC record.
    ///
    /// Returns `Ok(Some(record))` if a record was successfully read, `Ok(None)` at
    /// a clean end of input, or `Err` if a parsing error occurred.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The leader or directory is malformed
    /// - The input ends in the middle of a record
    /// - Field data cannot be decoded in the configured charset
    /// - An I/O error occurs
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let mut leader_bytes = [0u8; LEADER_LEN];
        match read_fully(&mut self.reader, &mut leader_bytes)? {
            0 => return Ok(None),
            LEADER_LEN => {},
            partial => {
                return Err(MarcError::TruncatedRecord(format!(
                    "input ends after {partial} bytes of a {LEADER_LEN}-byte leader"
                )));
            },
        }

        let leader = Leader::from_bytes(&leader_bytes)?;
        leader.validate_for_reading()?;

        let record_length = leader.record_length as usize;
        let base_address = leader.data_base_address as usize;

        let mut record_data = vec![0u8; record_length - LEADER_LEN];
        match self.reader.read_exact(&mut record_data) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(MarcError::TruncatedRecord(
                    "Unexpected end of file while reading record data".to_string(),
                ));
            },
            Err(e) => return Err(MarcError::IoError(e)),
        }

        if record_data.last() != Some(&RECORD_TERMINATOR) {
            return Err(MarcError::InvalidRecord(
                "Record does not end with a record terminator".to_string(),
            ));
        }

        let (directory, data) = record_data.split_at(base_address - LEADER_LEN);
        let mut record = Record::new(leader);

        // Directory entries are 12 bytes each: tag(3) + length(4) + start(5)
        let mut pos = 0;
        while pos < directory.len() && directory[pos] != FIELD_TERMINATOR {
            let Some(entry) = directory.get(pos..pos + 12) else {
                return Err(MarcError::InvalidRecord(
                    "Incomplete directory entry".to_string(),
                ));
            };
            pos += 12;

            let tag = String::from_utf8_lossy(&entry[0..3]).to_string();
            let field_length = parse_number(&entry[3..7])?;
            let start_position = parse_number(&entry[7..12])?;

            let end_position = start_position + field_length;
            if field_length == 0 || end_position > data.len() {
                return Err(MarcError::InvalidRecord(format!(
                    "Field {tag} exceeds data area"
                )));
            }

            // Drop the field terminator
            let field_data = &data[start_position..end_position - 1];

            if is_control_tag(&tag) {
                let value = self.charset.decode(field_data)?.into_owned();
                record.add_control_field(tag, value);
            } else {
                let field = parse_data_field(field_data, &tag, self.charset)?;
                record.add_field(field);
            }
        }

        self.records_read += 1;
        Ok(Some(record))
    }
}

impl<R: Read + std::fmt::Debug> FormatReader for MarcReader<R> {
    fn read_record(&mut self) -> Result<Option<Record>> {
        MarcReader::read_record(self)
    }

    fn records_read(&self) -> Option<usize> {
        Some(self.records_read)
    }
}

/// Fill `buf` from `reader`, returning how many bytes were read before end of input.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {},
            Err(e) => return Err(MarcError::IoError(e)),
        }
    }
    Ok(filled)
}

/// Parse a data field from raw bytes (field terminator already removed)
fn parse_data_field(data: &[u8], tag: &str, charset: Charset) -> Result<Field> {
    if data.len() < 2 {
        return Err(MarcError::InvalidField(format!(
            "Tag {tag}: data field too short (needs indicators)"
        )));
    }

    let mut field = Field::new(tag.to_string(), data[0] as char, data[1] as char);

    let subfield_data = &data[2..];
    if subfield_data.is_empty() {
        return Ok(field);
    }
    if subfield_data[0] != SUBFIELD_DELIMITER {
        return Err(MarcError::InvalidField(format!(
            "Tag {tag}: expected subfield delimiter"
        )));
    }

    for chunk in subfield_data[1..].split(|&b| b == SUBFIELD_DELIMITER) {
        let Some((&code, value)) = chunk.split_first() else {
            return Err(MarcError::InvalidField(format!(
                "Tag {tag}: subfield delimiter without a code"
            )));
        };
        field.add_subfield(code as char, charset.decode(value)?.into_owned());
    }

    Ok(field)
}

/// Parse a fixed-width ASCII number from bytes
fn parse_number(bytes: &[u8]) -> Result<usize> {
    let mut result = 0usize;
    for &byte in bytes {
        if byte.is_ascii_digit() {
            result = result * 10 + (byte - b'0') as usize;
        } else {
            return Err(MarcError::InvalidRecord(format!(
                "Invalid numeric field: expected digits, got byte {}",
                byte as char
            )));
        }
    }
    Ok(result)
}
