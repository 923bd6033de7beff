//! Writing MARC records to ISO 2709 binary format.
//!
//! This module provides [`encode_record`], a pure function that turns one
//! [`Record`] into its exact ISO 2709 bytes, and the [`Iso2709Encoder`] that
//! plugs it into the conversion pipeline.
//!
//! # Record layout
//!
//! ```text
//! leader (24) | directory (12 per field) | 0x1E | field data ... | 0x1D
//! ```
//!
//! Each directory entry is the tag, a 4-digit field length (terminator
//! included) and a 5-digit start offset relative to the base address of data.
//!
//! # Examples
//!
//! ```
//! use alephmarc::{encode_record, Charset, Field, Leader, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut record = Record::new(Leader::default());
//! let mut field = Field::new("245".to_string(), '1', '0');
//! field.add_subfield('a', "Title".to_string());
//! record.add_field(field);
//!
//! let bytes = encode_record(&record, Charset::utf8())?;
//! assert_eq!(&bytes[0..5], b"00048");
//! assert_eq!(bytes.len(), 48);
//! # Ok(())
//! # }
//! ```

use crate::encoding::Charset;
use crate::error::{MarcError, Result};
use crate::formats::RecordEncoder;
use crate::leader::{LEADER_LEN, MAX_RECORD_LENGTH};
use crate::record::{Record, VariableField};

/// Byte terminating every field and the directory.
pub const FIELD_TERMINATOR: u8 = 0x1E;
/// Byte introducing each subfield.
pub const SUBFIELD_DELIMITER: u8 = 0x1F;
/// Byte terminating a record.
pub const RECORD_TERMINATOR: u8 = 0x1D;

/// Largest field length a 4-digit directory entry can hold.
pub const MAX_FIELD_LENGTH: usize = 9_999;

const DIRECTORY_ENTRY_LEN: usize = 12;

/// Leader positions 20-23 for a 4-digit length and 5-digit start directory.
const ENTRY_MAP: &str = "4500";

/// Encode a record to ISO 2709.
///
/// Field data is converted to `charset`. The leader is copied from the record
/// with every position that describes the layout replaced: record length
/// (0-4), character coding (9, `a` for UTF-8 and blank otherwise), indicator
/// and subfield code counts (10-11), base address of data (12-16) and the
/// entry map (20-23). The record itself is not modified.
///
/// # Errors
///
/// Returns [`MarcError::EncodingError`] if:
/// - a tag is not three ASCII alphanumerics, or an indicator or subfield code
///   is not a printable ASCII character
/// - a value contains an ISO 2709 delimiter byte or cannot be represented in `charset`
/// - a field is longer than 9999 bytes or starts beyond offset 99999
/// - the directory pushes the base address of data beyond 99999
/// - the whole record is longer than 99999 bytes
pub fn encode_record(record: &Record, charset: Charset) -> Result<Vec<u8>> {
    let mut data_area = Vec::new();
    let mut directory = Vec::with_capacity(record.len() * DIRECTORY_ENTRY_LEN + 1);

    for field in record.variable_fields() {
        let tag = field.tag();
        check_tag(tag)?;
        let start = data_area.len();

        match field {
            VariableField::Control(cf) => push_value(&mut data_area, &cf.value, charset, tag)?,
            VariableField::Data(f) => {
                data_area.push(indicator_byte(f.indicator1, tag)?);
                data_area.push(indicator_byte(f.indicator2, tag)?);
                for subfield in &f.subfields {
                    data_area.push(SUBFIELD_DELIMITER);
                    data_area.push(subfield_code_byte(subfield.code, tag)?);
                    push_value(&mut data_area, &subfield.value, charset, tag)?;
                }
            },
        }
        data_area.push(FIELD_TERMINATOR);

        let length = data_area.len() - start;
        if length > MAX_FIELD_LENGTH {
            return Err(MarcError::EncodingError(format!(
                "field {tag} is {length} bytes, a directory entry holds at most {MAX_FIELD_LENGTH}"
            )));
        }
        if start > MAX_RECORD_LENGTH {
            return Err(MarcError::EncodingError(format!(
                "field {tag} starts at offset {start}, beyond the 5-digit limit"
            )));
        }

        directory.extend_from_slice(tag.as_bytes());
        directory.extend_from_slice(format!("{length:04}{start:05}").as_bytes());
    }

    directory.push(FIELD_TERMINATOR);

    let base_address = LEADER_LEN + directory.len();
    if base_address > MAX_RECORD_LENGTH {
        return Err(MarcError::EncodingError(format!(
            "directory of {} entries puts the base address at {base_address}",
            record.len()
        )));
    }
    let record_length = base_address + data_area.len() + 1;
    if record_length > MAX_RECORD_LENGTH {
        return Err(MarcError::EncodingError(format!(
            "record is {record_length} bytes, ISO 2709 allows at most {MAX_RECORD_LENGTH}"
        )));
    }

    let mut leader = record.leader.clone();
    leader.character_coding = if charset.is_utf8() { 'a' } else { ' ' };
    leader.indicator_count = 2;
    leader.subfield_code_count = 2;
    leader.reserved = ENTRY_MAP.to_string();
    leader.record_length = u32::try_from(record_length)
        .map_err(|_| MarcError::EncodingError("record length out of range".to_string()))?;
    leader.data_base_address = u32::try_from(base_address)
        .map_err(|_| MarcError::EncodingError("base address out of range".to_string()))?;

    let mut out = Vec::with_capacity(record_length);
    out.extend_from_slice(&leader.as_bytes()?);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data_area);
    out.push(RECORD_TERMINATOR);

    debug_assert_eq!(out.len(), record_length);
    Ok(out)
}

fn check_tag(tag: &str) -> Result<()> {
    let bytes = tag.as_bytes();
    if bytes.len() == 3 && bytes.iter().all(u8::is_ascii_alphanumeric) {
        Ok(())
    } else {
        Err(MarcError::EncodingError(format!(
            "tag {tag:?} is not three ASCII alphanumerics"
        )))
    }
}

fn indicator_byte(indicator: char, tag: &str) -> Result<u8> {
    if indicator.is_ascii() && !indicator.is_ascii_control() {
        Ok(indicator as u8)
    } else {
        Err(MarcError::EncodingError(format!(
            "field {tag}: indicator {indicator:?} is not printable ASCII"
        )))
    }
}

fn subfield_code_byte(code: char, tag: &str) -> Result<u8> {
    if code.is_ascii_graphic() {
        Ok(code as u8)
    } else {
        Err(MarcError::EncodingError(format!(
            "field {tag}: subfield code {code:?} is not a printable ASCII character"
        )))
    }
}

fn push_value(out: &mut Vec<u8>, value: &str, charset: Charset, tag: &str) -> Result<()> {
    let bytes = charset.encode(value)?;
    if memchr::memchr3(FIELD_TERMINATOR, SUBFIELD_DELIMITER, RECORD_TERMINATOR, &bytes).is_some()
    {
        return Err(MarcError::EncodingError(format!(
            "field {tag}: value contains an ISO 2709 delimiter byte"
        )));
    }
    out.extend_from_slice(&bytes);
    Ok(())
}

/// [`RecordEncoder`] producing ISO 2709 records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso2709Encoder {
    charset: Charset,
}

impl Iso2709Encoder {
    /// Create an encoder writing field data in `charset`
    #[must_use]
    pub fn new(charset: Charset) -> Self {
        Iso2709Encoder { charset }
    }

    /// The output charset
    #[must_use]
    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl RecordEncoder for Iso2709Encoder {
    fn encode(&mut self, record: &Record) -> Result<Vec<u8>> {
        encode_record(record, self.charset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::reader::MarcReader;
    use crate::record::Field;
    use std::io::Cursor;

    fn title_record() -> Record {
        let mut record = Record::new(Leader::default());
        record.add_control_field_str("001", "12345");
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield_str('a', "Title");
        field.add_subfield_str('b', "Subtitle");
        record.add_field(field);
        record
    }

    #[test]
    fn test_encode_matches_reference_bytes() {
        let bytes = encode_record(&title_record(), Charset::utf8()).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"00076nam a2200049 i 4500");
        expected.extend_from_slice(b"001000600000");
        expected.extend_from_slice(b"245002000006");
        expected.push(FIELD_TERMINATOR);
        expected.extend_from_slice(b"12345");
        expected.push(FIELD_TERMINATOR);
        expected.extend_from_slice(b"10");
        expected.push(SUBFIELD_DELIMITER);
        expected.extend_from_slice(b"aTitle");
        expected.push(SUBFIELD_DELIMITER);
        expected.extend_from_slice(b"bSubtitle");
        expected.push(FIELD_TERMINATOR);
        expected.push(RECORD_TERMINATOR);

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encode_simple_record_length() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield('a', "Test title".to_string());
        record.add_field(field);

        let bytes = encode_record(&record, Charset::utf8()).unwrap();
        // 24 leader + 13 directory + 15 field data + 1 record terminator
        assert_eq!(&bytes[0..5], b"00053");
        assert_eq!(bytes.len(), 53);
        assert_eq!(&bytes[12..17], b"00037");
    }

    #[test]
    fn test_encode_does_not_touch_caller_leader() {
        let record = title_record();
        let before = record.leader.clone();
        encode_record(&record, Charset::utf8()).unwrap();
        assert_eq!(record.leader, before);
    }

    #[test]
    fn test_layout_positions_follow_encoder() {
        let mut record = title_record();
        record.leader = Leader::from_template(b"00000nam a0000000 a     ").unwrap();
        assert_eq!(record.leader.indicator_count, 0);

        let bytes = encode_record(&record, Charset::utf8()).unwrap();
        assert_eq!(&bytes[10..12], b"22");
        assert_eq!(&bytes[20..24], b"4500");
        assert!(MarcReader::new(Cursor::new(bytes)).read_record().is_ok());
    }

    #[test]
    fn test_character_coding_follows_output_charset() {
        let record = title_record();
        assert_eq!(record.leader.character_coding, 'a');

        let utf8 = encode_record(&record, Charset::utf8()).unwrap();
        assert_eq!(utf8[9], b'a');

        let latin1 = encode_record(&record, Charset::for_output("windows-1252").unwrap()).unwrap();
        assert_eq!(latin1[9], b' ');

        let mut marc8_leader = record.clone();
        marc8_leader.leader.character_coding = ' ';
        let relabelled = encode_record(&marc8_leader, Charset::utf8()).unwrap();
        assert_eq!(relabelled[9], b'a');
    }

    #[test]
    fn test_empty_record_encodes() {
        let bytes = encode_record(&Record::new(Leader::default()), Charset::utf8()).unwrap();
        assert_eq!(bytes.len(), 26);
        assert_eq!(&bytes[0..5], b"00026");
        assert_eq!(&bytes[12..17], b"00025");
    }

    #[test]
    fn test_field_order_preserved_across_kinds() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("245".to_string(), '0', '0');
        field.add_subfield_str('a', "First");
        record.add_field(field);
        record.add_control_field_str("001", "second");

        let bytes = encode_record(&record, Charset::utf8()).unwrap();
        assert_eq!(&bytes[24..27], b"245");
        assert_eq!(&bytes[36..39], b"001");
    }

    #[test]
    fn test_field_too_long() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("500".to_string(), ' ', ' ');
        field.add_subfield('a', "x".repeat(MAX_FIELD_LENGTH));
        record.add_field(field);

        let err = encode_record(&record, Charset::utf8()).unwrap_err();
        assert!(matches!(err, MarcError::EncodingError(_)));
        assert!(err.to_string().contains("field 500"), "got: {err}");
    }

    #[test]
    fn test_record_too_long() {
        let mut record = Record::new(Leader::default());
        for _ in 0..12 {
            let mut field = Field::new("500".to_string(), ' ', ' ');
            field.add_subfield('a', "x".repeat(9_000));
            record.add_field(field);
        }
        let err = encode_record(&record, Charset::utf8()).unwrap_err();
        assert!(matches!(err, MarcError::EncodingError(_)));
    }

    #[test]
    fn test_directory_too_large() {
        let mut record = Record::new(Leader::default());
        for _ in 0..8_400 {
            record.add_control_field_str("005", "");
        }
        let err = encode_record(&record, Charset::utf8()).unwrap_err();
        assert!(err.to_string().contains("base address"), "got: {err}");
    }

    #[test]
    fn test_unencodable_value() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield_str('a', "Ωmega");
        record.add_field(field);

        let charset = Charset::for_output("windows-1252").unwrap();
        let err = encode_record(&record, charset).unwrap_err();
        assert!(matches!(err, MarcError::EncodingError(_)));
    }

    #[test]
    fn test_delimiter_in_value_rejected() {
        let mut record = Record::new(Leader::default());
        record.add_control_field_str("001", "bad\u{1e}value");
        assert!(encode_record(&record, Charset::utf8()).is_err());
    }

    #[test]
    fn test_invalid_tag_rejected() {
        let mut record = Record::new(Leader::default());
        record.add_control_field_str("01", "short");
        assert!(encode_record(&record, Charset::utf8()).is_err());
    }

    #[test]
    fn test_invalid_subfield_code_rejected() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield_str(' ', "blank code");
        record.add_field(field);
        assert!(encode_record(&record, Charset::utf8()).is_err());
    }

    #[test]
    fn test_single_byte_output_charset() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield_str('a', "Café");
        record.add_field(field);

        let charset = Charset::for_output("iso-8859-1").unwrap();
        let bytes = encode_record(&record, charset).unwrap();
        assert!(bytes.windows(4).any(|w| w == b"Caf\xe9"));
    }

    #[test]
    fn test_encode_and_read_roundtrip() {
        let bytes = encode_record(&title_record(), Charset::utf8()).unwrap();

        let mut reader = MarcReader::new(Cursor::new(bytes));
        let read_record = reader.read_record().unwrap().unwrap();

        assert_eq!(read_record.get_control_field("001"), Some("12345"));
        let field = read_record.get_field("245").unwrap();
        assert_eq!(field.indicator1, '1');
        assert_eq!(field.indicator2, '0');
        assert_eq!(field.get_subfield('a'), Some("Title"));
        assert_eq!(field.get_subfield('b'), Some("Subtitle"));
    }

    #[test]
    fn test_encoder_output_concatenates() {
        let mut encoder = Iso2709Encoder::default();
        let mut buffer = Vec::new();
        for i in 0..3 {
            let mut record = Record::new(Leader::default());
            let mut field = Field::new("245".to_string(), '1', '0');
            field.add_subfield('a', format!("Title {i}"));
            record.add_field(field);
            buffer.extend(encoder.encode(&record).unwrap());
        }

        let mut reader = MarcReader::new(Cursor::new(buffer));
        for i in 0..3 {
            let record = reader.read_record().unwrap().unwrap();
            assert_eq!(
                record.get_field("245").unwrap().get_subfield('a'),
                Some(format!("Title {i}").as_str())
            );
        }
        assert!(reader.read_record().unwrap().is_none());
    }
}
