//! MARC record leader parsing and manipulation.
//!
//! The MARC leader is a 24-byte fixed-length field at the start of every MARC record.
//! It contains metadata describing the record's structure, content type, and encoding.
//!
//! # Structure
//!
//! - Positions 0-4: Record length (5 digits)
//! - Position 5: Record status
//! - Position 6: Record type (a = language material, c = music, etc.)
//! - Position 7: Bibliographic level (m = monograph, s = serial, etc.)
//! - Position 8: Control record type
//! - Position 9: Character coding (space = MARC-8, a = UTF-8)
//! - Position 10: Indicator count (usually 2)
//! - Position 11: Subfield code count (usually 2)
//! - Positions 12-16: Base address of data (5 digits)
//! - Positions 17-19: Encoding level, cataloging form, multipart level
//! - Positions 20-23: Entry map (usually "4500")

use crate::error::{MarcError, Result};
use serde::{Deserialize, Serialize};

/// Length of the leader in bytes.
pub const LEADER_LEN: usize = 24;

/// Largest value a 5-digit leader length field can hold.
pub const MAX_RECORD_LENGTH: usize = 99_999;

/// MARC Leader - 24 bytes at the start of every MARC record.
///
/// Contains metadata about the record structure and content.
/// All MARC records must begin with exactly 24 bytes of leader information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    /// Record length (5 digits) - positions 0-4
    pub record_length: u32,
    /// Record status (1 char) - position 5
    pub record_status: char,
    /// Type of record (1 char) - position 6
    pub record_type: char,
    /// Bibliographic level (1 char) - position 7
    pub bibliographic_level: char,
    /// Type of control record (1 char) - position 8
    pub control_record_type: char,
    /// Character coding scheme (1 char) - position 9
    pub character_coding: char,
    /// Indicator count (1 digit) - position 10 (usually 2)
    pub indicator_count: u8,
    /// Subfield code count (1 digit) - position 11 (usually 2)
    pub subfield_code_count: u8,
    /// Base address of data (5 digits) - positions 12-16
    pub data_base_address: u32,
    /// Encoding level (1 char) - position 17
    pub encoding_level: char,
    /// Cataloging form (1 char) - position 18
    pub cataloging_form: char,
    /// Multipart resource record level (1 char) - position 19
    pub multipart_level: char,
    /// Entry map (4 chars) - positions 20-23
    pub reserved: String,
}

impl Default for Leader {
    /// `00000nam a2200000 i 4500`, a new UTF-8 monograph.
    fn default() -> Self {
        Leader {
            record_length: 0,
            record_status: 'n',
            record_type: 'a',
            bibliographic_level: 'm',
            control_record_type: ' ',
            character_coding: 'a',
            indicator_count: 2,
            subfield_code_count: 2,
            data_base_address: 0,
            encoding_level: ' ',
            cataloging_form: 'i',
            multipart_level: ' ',
            reserved: "4500".to_string(),
        }
    }
}

impl Leader {
    /// Parse a leader from 24 bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are invalid or too short.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Leader must be at least 24 bytes, got {}",
                bytes.len()
            )));
        }

        let record_length = parse_digits(&bytes[0..5])?;
        let data_base_address = parse_digits(&bytes[12..17])?;
        Self::from_parts(bytes, record_length, data_base_address)
    }

    /// Parse a leader whose length fields are placeholders.
    ///
    /// Positions 0-4 and 12-16 are ignored and set to zero; the encoder
    /// recomputes them. Sequential sources usually carry blanks or stale
    /// numbers there.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is not exactly 24 bytes or the
    /// indicator/subfield counts are not digits.
    pub fn from_template(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Leader must be exactly 24 bytes, got {}",
                bytes.len()
            )));
        }
        Self::from_parts(bytes, 0, 0)
    }

    fn from_parts(bytes: &[u8], record_length: u32, data_base_address: u32) -> Result<Self> {
        let indicator_count = parse_count(bytes[10], "indicator count", 10)?;
        let subfield_code_count = parse_count(bytes[11], "subfield code count", 11)?;

        Ok(Leader {
            record_length,
            record_status: bytes[5] as char,
            record_type: bytes[6] as char,
            bibliographic_level: bytes[7] as char,
            control_record_type: bytes[8] as char,
            character_coding: bytes[9] as char,
            indicator_count,
            subfield_code_count,
            data_base_address,
            encoding_level: bytes[17] as char,
            cataloging_form: bytes[18] as char,
            multipart_level: bytes[19] as char,
            reserved: String::from_utf8_lossy(&bytes[20..24]).to_string(),
        })
    }

    /// Validate that the leader is suitable for binary record reading.
    ///
    /// Checks that `record_length` and `data_base_address` are at least 24,
    /// which is required before performing arithmetic on these fields during
    /// binary ISO 2709 parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if `record_length` or `data_base_address` is less than 24,
    /// or if the base address lies beyond the end of the record.
    pub fn validate_for_reading(&self) -> Result<()> {
        if self.record_length < 24 {
            return Err(MarcError::InvalidLeader(format!(
                "Record length must be at least 24, got {}",
                self.record_length
            )));
        }
        if self.data_base_address < 24 {
            return Err(MarcError::InvalidLeader(format!(
                "Base address of data must be at least 24, got {}",
                self.data_base_address
            )));
        }
        if self.data_base_address > self.record_length {
            return Err(MarcError::InvalidLeader(format!(
                "Base address {} lies beyond record length {}",
                self.data_base_address, self.record_length
            )));
        }
        Ok(())
    }

    /// Serialize leader to 24-byte array
    ///
    /// # Errors
    ///
    /// Returns an error if a length does not fit in five digits, a position holds
    /// a non-ASCII character, or the entry map is not four bytes.
    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(LEADER_LEN);

        bytes.extend_from_slice(five_digits(self.record_length, "record length")?.as_bytes());
        bytes.push(ascii_byte(self.record_status, 5)?);
        bytes.push(ascii_byte(self.record_type, 6)?);
        bytes.push(ascii_byte(self.bibliographic_level, 7)?);
        bytes.push(ascii_byte(self.control_record_type, 8)?);
        bytes.push(ascii_byte(self.character_coding, 9)?);
        bytes.push(count_byte(self.indicator_count, 10)?);
        bytes.push(count_byte(self.subfield_code_count, 11)?);
        bytes.extend_from_slice(five_digits(self.data_base_address, "base address")?.as_bytes());
        bytes.push(ascii_byte(self.encoding_level, 17)?);
        bytes.push(ascii_byte(self.cataloging_form, 18)?);
        bytes.push(ascii_byte(self.multipart_level, 19)?);

        let reserved_bytes = self.reserved.as_bytes();
        if reserved_bytes.len() != 4 || !reserved_bytes.is_ascii() {
            return Err(MarcError::InvalidLeader(format!(
                "Entry map must be 4 ASCII characters, got {:?}",
                self.reserved
            )));
        }
        bytes.extend_from_slice(reserved_bytes);

        Ok(bytes)
    }
}

fn five_digits(value: u32, what: &str) -> Result<String> {
    if value as usize > MAX_RECORD_LENGTH {
        return Err(MarcError::EncodingError(format!(
            "{what} {value} does not fit in 5 digits"
        )));
    }
    Ok(format!("{value:05}"))
}

fn ascii_byte(c: char, position: usize) -> Result<u8> {
    if c.is_ascii() && !c.is_ascii_control() {
        Ok(c as u8)
    } else {
        Err(MarcError::InvalidLeader(format!(
            "Leader position {position} must be printable ASCII, got {c:?}"
        )))
    }
}

fn count_byte(count: u8, position: usize) -> Result<u8> {
    if count > 9 {
        return Err(MarcError::InvalidLeader(format!(
            "Leader position {position} must be a single digit, got {count}"
        )));
    }
    Ok(b'0' + count)
}

fn parse_count(byte: u8, what: &str, position: usize) -> Result<u8> {
    (byte as char)
        .to_digit(10)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| {
            MarcError::InvalidLeader(format!(
                "Invalid {what} at position {position}: {}",
                byte as char
            ))
        })
}

/// Parse 5-digit ASCII number from bytes
fn parse_digits(bytes: &[u8]) -> Result<u32> {
    if bytes.len() != 5 {
        return Err(MarcError::InvalidLeader(format!(
            "Expected 5-digit field, got {} bytes",
            bytes.len()
        )));
    }

    let s = String::from_utf8_lossy(bytes);
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(MarcError::InvalidLeader(format!("Invalid numeric field: '{s}'")));
    }
    s.parse::<u32>()
        .map_err(|_| MarcError::InvalidLeader(format!("Invalid numeric field: '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_from_bytes() {
        let bytes = b"01234567890120123456DUMMY";
        let leader = Leader::from_bytes(bytes).unwrap();

        assert_eq!(leader.record_length, 1234);
        assert_eq!(leader.record_status, '5');
        assert_eq!(leader.record_type, '6');
        assert_eq!(leader.bibliographic_level, '7');
        assert_eq!(leader.control_record_type, '8');
        assert_eq!(leader.character_coding, '9');
        assert_eq!(leader.indicator_count, 0);
        assert_eq!(leader.subfield_code_count, 1);
        assert_eq!(leader.data_base_address, 20123);
        assert_eq!(leader.encoding_level, '4');
        assert_eq!(leader.cataloging_form, '5');
        assert_eq!(leader.multipart_level, '6');
        assert_eq!(leader.reserved, "DUMM");
    }

    #[test]
    fn test_leader_roundtrip() {
        let original = Leader {
            record_length: 2048,
            record_status: 'c',
            record_type: 'z',
            bibliographic_level: ' ',
            control_record_type: ' ',
            character_coding: 'a',
            indicator_count: 2,
            subfield_code_count: 2,
            data_base_address: 256,
            encoding_level: 'n',
            cataloging_form: ' ',
            multipart_level: ' ',
            reserved: "4500".to_string(),
        };

        let bytes = original.as_bytes().unwrap();
        assert_eq!(bytes.len(), LEADER_LEN);
        let parsed = Leader::from_bytes(&bytes).unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn test_default_leader_bytes() {
        let bytes = Leader::default().as_bytes().unwrap();
        assert_eq!(&bytes, b"00000nam a2200000 i 4500");
    }

    #[test]
    fn test_leader_too_short() {
        let bytes = b"0123456789012";
        assert!(Leader::from_bytes(bytes).is_err());
    }

    #[test]
    fn test_leader_invalid_indicator_count() {
        let bytes = b"01234567890X20123456DUMMY";
        assert!(Leader::from_bytes(bytes).is_err());
    }

    #[test]
    fn test_leader_rejects_blank_length() {
        let bytes = b"     nam a22     i 4500 ";
        assert!(Leader::from_bytes(&bytes[..24]).is_err());
    }

    #[test]
    fn test_from_template_ignores_length_fields() {
        let leader = Leader::from_template(b"     cz  a22     n  4500").unwrap();
        assert_eq!(leader.record_length, 0);
        assert_eq!(leader.data_base_address, 0);
        assert_eq!(leader.record_status, 'c');
        assert_eq!(leader.record_type, 'z');
        assert_eq!(leader.encoding_level, 'n');
    }

    #[test]
    fn test_from_template_requires_exact_length() {
        let result = Leader::from_template(b"00000nam a2200000 i 450");
        assert!(matches!(result, Err(MarcError::InvalidLeader(_))));
    }

    #[test]
    fn test_as_bytes_rejects_six_digit_length() {
        let leader = Leader {
            record_length: 100_000,
            ..Leader::default()
        };
        assert!(matches!(leader.as_bytes(), Err(MarcError::EncodingError(_))));
    }

    #[test]
    fn test_as_bytes_rejects_non_ascii_position() {
        let leader = Leader {
            record_status: 'é',
            ..Leader::default()
        };
        assert!(matches!(leader.as_bytes(), Err(MarcError::InvalidLeader(_))));
    }

    #[test]
    fn test_validate_for_reading_rejects_small_record_length() {
        let bytes = b"00010nam a2200025 i 4500";
        let leader = Leader::from_bytes(bytes).unwrap();
        let err = leader.validate_for_reading().unwrap_err().to_string();
        assert!(
            err.contains("Record length must be at least 24"),
            "got: {err}"
        );
    }

    #[test]
    fn test_validate_for_reading_rejects_small_base_address() {
        let bytes = b"00050nam a2200010 i 4500";
        let leader = Leader::from_bytes(bytes).unwrap();
        let err = leader.validate_for_reading().unwrap_err().to_string();
        assert!(
            err.contains("Base address of data must be at least 24"),
            "got: {err}"
        );
    }

    #[test]
    fn test_validate_for_reading_rejects_base_past_end() {
        let bytes = b"00050nam a2200080 i 4500";
        let leader = Leader::from_bytes(bytes).unwrap();
        assert!(leader.validate_for_reading().is_err());
    }
}
