//! Reading and writing Aleph sequential text.
//!
//! Aleph sequential is the line-oriented export format of the Aleph ILS.
//! Every line carries one field of one record:
//!
//! ```text
//! 000000001 LDR   L ^^^^^nam^a22^^^^^^a^4500
//! 000000001 001   L 12345
//! 000000001 24510 L $$aTitle$$bSubtitle
//! ```
//!
//! Columns 0-8 hold the record id, column 9 a space, 10-12 the tag, 13 and 14
//! the indicators, 15-17 the ` L ` marker, and the field data starts at
//! column 18. Consecutive lines with the same id form one record. `^` stands
//! for a blank in the leader and in control fields; data fields are a run of
//! `$$` + code + value.

use crate::encoding::Charset;
use crate::error::{MarcError, Result};
use crate::formats::{FormatReader, RecordEncoder};
use crate::leader::{Leader, LEADER_LEN};
use crate::record::{is_control_tag, ControlField, Field, Record, VariableField};
use crate::recovery::{RecoveryContext, RecoveryMode};
use log::{debug, trace};
use memchr::memmem;
use std::io::BufRead;

/// Width of the record id column.
pub const RECORD_ID_LEN: usize = 9;

/// Tag of the line carrying the leader.
pub const LEADER_TAG: &str = "LDR";

const PREFIX_LEN: usize = 18;
const FORMAT_MARKER: &str = " L ";
const SUBFIELD_MARKER: &[u8] = b"$$";
const BLANK: char = '^';
const MAX_RECORD_ID: u64 = 999_999_999;

/// One well-formed line, owned so it can be held back across records.
#[derive(Debug)]
struct SequentialLine {
    number: usize,
    id: String,
    content: LineContent,
}

#[derive(Debug)]
enum LineContent {
    Leader(Leader),
    Field(VariableField),
}

/// The record being accumulated from lines sharing one id.
#[derive(Debug)]
struct PartialRecord {
    id: String,
    record: Record,
    has_leader: bool,
}

impl PartialRecord {
    fn new(id: String) -> Self {
        PartialRecord {
            id,
            record: Record::new(Leader::default()),
            has_leader: false,
        }
    }

    fn apply(&mut self, line: SequentialLine, recovery: &mut RecoveryContext) -> Result<()> {
        match line.content {
            LineContent::Leader(_) if self.has_leader => recovery.recover(MarcError::parse(
                line.number,
                format!("duplicate LDR line for record {}", self.id),
            )),
            LineContent::Leader(leader) => {
                self.record.leader = leader;
                self.has_leader = true;
                Ok(())
            },
            LineContent::Field(field) => {
                self.record.push(field);
                Ok(())
            },
        }
    }
}

/// Reader for Aleph sequential text.
///
/// Records are produced lazily: lines are pulled from the source only until
/// the next record id appears. That first line of the next record is held
/// back and starts the following call. A record without an `LDR` line gets
/// [`Leader::default`].
///
/// # Examples
///
/// ```
/// use alephmarc::AlephSequentialReader;
/// use std::io::Cursor;
///
/// let text = "000000001 001   L 12345\n000000001 24510 L $$aTitle$$bSubtitle\n";
/// let mut reader = AlephSequentialReader::new(Cursor::new(text));
///
/// let record = reader.read_record()?.unwrap();
/// assert_eq!(record.get_control_field("001"), Some("12345"));
/// assert_eq!(record.get_field("245").unwrap().get_subfield('b'), Some("Subtitle"));
/// assert!(reader.read_record()?.is_none());
/// # Ok::<(), alephmarc::MarcError>(())
/// ```
#[derive(Debug)]
pub struct AlephSequentialReader<R: BufRead> {
    reader: R,
    charset: Charset,
    recovery: RecoveryContext,
    buffer: Vec<u8>,
    line_number: usize,
    pending: Option<SequentialLine>,
    last_record_id: Option<String>,
    records_read: usize,
}

impl<R: BufRead> AlephSequentialReader<R> {
    /// Create a reader decoding UTF-8 text in [`RecoveryMode::Strict`].
    pub fn new(reader: R) -> Self {
        AlephSequentialReader {
            reader,
            charset: Charset::utf8(),
            recovery: RecoveryContext::default(),
            buffer: Vec::new(),
            line_number: 0,
            pending: None,
            last_record_id: None,
            records_read: 0,
        }
    }

    /// Set the charset of the input text.
    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Set the policy for malformed lines.
    #[must_use]
    pub fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.recovery = RecoveryContext::new(mode);
        self
    }

    /// Id of the record most recently returned by [`read_record`](Self::read_record).
    #[must_use]
    pub fn last_record_id(&self) -> Option<&str> {
        self.last_record_id.as_deref()
    }

    /// Number of malformed lines skipped in lenient mode.
    #[must_use]
    pub fn lines_skipped(&self) -> usize {
        self.recovery.skipped()
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ParseError`] for a malformed line in strict mode,
    /// [`MarcError::EncodingError`] if the input is not valid in the
    /// configured charset, and [`MarcError::IoError`] if reading fails.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let mut current: Option<PartialRecord> = None;

        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => match self.next_line()? {
                    Some(line) => line,
                    None => break,
                },
            };

            if current.as_ref().is_some_and(|partial| partial.id != line.id) {
                self.pending = Some(line);
                break;
            }

            let partial = current.get_or_insert_with(|| PartialRecord::new(line.id.clone()));
            partial.apply(line, &mut self.recovery)?;
        }

        let Some(partial) = current else {
            return Ok(None);
        };

        debug!(
            "read record {} with {} fields",
            partial.id,
            partial.record.len()
        );
        self.records_read += 1;
        self.last_record_id = Some(partial.id);
        Ok(Some(partial.record))
    }

    /// Pull the next well-formed line, skipping blank ones.
    fn next_line(&mut self) -> Result<Option<SequentialLine>> {
        loop {
            self.buffer.clear();
            if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let number = self.line_number;

            let decoded = self
                .charset
                .decode(trim_line_end(&self.buffer))
                .map_err(|e| match e {
                    MarcError::EncodingError(message) => {
                        MarcError::EncodingError(format!("line {number}: {message}"))
                    },
                    other => other,
                })?;
            let mut text: &str = &decoded;
            if number == 1 {
                text = text.strip_prefix('\u{feff}').unwrap_or(text);
            }
            if text.trim().is_empty() {
                trace!("skipping blank line {number}");
                continue;
            }

            match parse_line(text, number) {
                Ok(line) => return Ok(Some(line)),
                Err(e) => self.recovery.recover(e)?,
            }
        }
    }
}

impl<R: BufRead + std::fmt::Debug> FormatReader for AlephSequentialReader<R> {
    fn read_record(&mut self) -> Result<Option<Record>> {
        AlephSequentialReader::read_record(self)
    }

    fn records_read(&self) -> Option<usize> {
        Some(self.records_read)
    }
}

fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Split one line into id, tag and content.
fn parse_line(text: &str, number: usize) -> Result<SequentialLine> {
    let bytes = text.as_bytes();
    if bytes.len() < PREFIX_LEN {
        return Err(MarcError::parse(
            number,
            format!(
                "line is {} bytes long, need at least {PREFIX_LEN}",
                bytes.len()
            ),
        ));
    }
    if !bytes[..PREFIX_LEN].is_ascii() {
        return Err(MarcError::parse(number, "non-ASCII character in the id/tag prefix"));
    }

    let id = &text[..RECORD_ID_LEN];
    if id.trim().is_empty() {
        return Err(MarcError::parse(number, "missing record id"));
    }
    if !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(MarcError::parse(
            number,
            format!("record id {id:?} is not {RECORD_ID_LEN} alphanumeric characters"),
        ));
    }
    if bytes[RECORD_ID_LEN] != b' ' {
        return Err(MarcError::parse(number, "expected a space after the record id"));
    }

    let tag = &text[10..13];
    if tag.trim().is_empty() {
        return Err(MarcError::parse(number, "missing tag"));
    }
    if !tag.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(MarcError::parse(number, format!("invalid tag {tag:?}")));
    }
    if &text[15..PREFIX_LEN] != FORMAT_MARKER {
        return Err(MarcError::parse(
            number,
            format!("missing {FORMAT_MARKER:?} marker after tag {tag}"),
        ));
    }

    let data = &text[PREFIX_LEN..];
    let content = if tag == LEADER_TAG {
        LineContent::Leader(parse_leader(data, number)?)
    } else if is_control_tag(tag) {
        LineContent::Field(VariableField::Control(ControlField {
            tag: tag.to_string(),
            value: data.replace(BLANK, " "),
        }))
    } else {
        let mut field = Field::new(tag.to_string(), bytes[13] as char, bytes[14] as char);
        parse_subfields(data, &mut field, number)?;
        LineContent::Field(VariableField::Data(field))
    };

    Ok(SequentialLine {
        number,
        id: id.to_string(),
        content,
    })
}

fn parse_leader(data: &str, number: usize) -> Result<Leader> {
    let template = data.replace(BLANK, " ");
    if !template.is_ascii() || template.len() != LEADER_LEN {
        return Err(MarcError::parse(
            number,
            format!("LDR must be {LEADER_LEN} ASCII characters, got {data:?}"),
        ));
    }
    Leader::from_template(template.as_bytes())
        .map_err(|e| MarcError::parse(number, format!("invalid LDR: {e}")))
}

fn parse_subfields(data: &str, field: &mut Field, number: usize) -> Result<()> {
    let bytes = data.as_bytes();
    if !bytes.starts_with(SUBFIELD_MARKER) {
        return Err(MarcError::parse(
            number,
            format!("data field {} does not start with $$", field.tag),
        ));
    }

    let mut starts = memmem::find_iter(bytes, SUBFIELD_MARKER).peekable();
    while let Some(start) = starts.next() {
        let end = starts.peek().copied().unwrap_or(bytes.len());
        let mut chunk = data[start + SUBFIELD_MARKER.len()..end].chars();
        let Some(code) = chunk.next() else {
            return Err(MarcError::parse(
                number,
                format!("field {}: $$ without a subfield code", field.tag),
            ));
        };
        field.add_subfield(code, chunk.as_str().to_string());
    }
    Ok(())
}

/// [`RecordEncoder`] producing Aleph sequential lines.
///
/// The record id is the `001` value when it is exactly nine digits, otherwise
/// the 1-based position of the record in the output, zero-padded.
#[derive(Debug, Default)]
pub struct AlephSequentialEncoder {
    charset: Charset,
    records_encoded: u64,
}

impl AlephSequentialEncoder {
    /// Create an encoder writing text in `charset`
    #[must_use]
    pub fn new(charset: Charset) -> Self {
        AlephSequentialEncoder {
            charset,
            records_encoded: 0,
        }
    }

    fn record_id(&self, record: &Record) -> Result<String> {
        match record.control_number() {
            Some(id) if id.len() == RECORD_ID_LEN && id.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(id.to_string())
            },
            _ if self.records_encoded > MAX_RECORD_ID => Err(MarcError::EncodingError(
                "ran out of nine-digit record ids".to_string(),
            )),
            _ => Ok(format!("{:09}", self.records_encoded)),
        }
    }
}

impl RecordEncoder for AlephSequentialEncoder {
    fn encode(&mut self, record: &Record) -> Result<Vec<u8>> {
        self.records_encoded += 1;
        let id = self.record_id(record)?;

        let leader: String = record
            .leader
            .as_bytes()?
            .iter()
            .map(|&b| if b == b' ' { BLANK } else { b as char })
            .collect();
        let mut text = format!("{id} {LEADER_TAG}   L {leader}\n");

        for field in record.variable_fields() {
            let tag = field.tag();
            check_tag(tag)?;
            match field {
                VariableField::Control(control) => {
                    if !is_control_tag(tag) {
                        return Err(MarcError::EncodingError(format!(
                            "tag {tag} cannot hold a control field"
                        )));
                    }
                    check_text(&control.value, tag)?;
                    if control.value.contains(BLANK) {
                        return Err(MarcError::EncodingError(format!(
                            "field {tag}: control value contains {BLANK:?}"
                        )));
                    }
                    text.push_str(&format!(
                        "{id} {tag}   L {}\n",
                        control.value.replace(' ', "^")
                    ));
                },
                VariableField::Data(data) => {
                    push_data_line(&mut text, &id, data)?;
                },
            }
        }

        Ok(self.charset.encode(&text)?.into_owned())
    }
}

fn push_data_line(text: &mut String, id: &str, field: &Field) -> Result<()> {
    let tag = field.tag.as_str();
    if is_control_tag(tag) {
        return Err(MarcError::EncodingError(format!(
            "tag {tag} cannot hold a data field"
        )));
    }
    for indicator in [field.indicator1, field.indicator2] {
        if !(indicator == ' ' || indicator.is_ascii_graphic()) {
            return Err(MarcError::EncodingError(format!(
                "field {tag}: indicator {indicator:?} is not printable ASCII"
            )));
        }
    }
    if field.subfields.is_empty() {
        return Err(MarcError::EncodingError(format!(
            "field {tag} has no subfields"
        )));
    }

    text.push_str(&format!(
        "{id} {tag}{}{} L ",
        field.indicator1, field.indicator2
    ));
    for subfield in &field.subfields {
        if !subfield.code.is_ascii_graphic() {
            return Err(MarcError::EncodingError(format!(
                "field {tag}: subfield code {:?} is not a printable ASCII character",
                subfield.code
            )));
        }
        check_text(&subfield.value, tag)?;
        // "x$" followed by "$$b" would be read back as code '$'
        if subfield.value.contains("$$") || subfield.value.ends_with('$') {
            return Err(MarcError::EncodingError(format!(
                "field {tag}: value {:?} collides with the $$ subfield marker",
                subfield.value
            )));
        }
        text.push_str("$$");
        text.push(subfield.code);
        text.push_str(&subfield.value);
    }
    text.push('\n');
    Ok(())
}

fn check_tag(tag: &str) -> Result<()> {
    if tag.len() == 3 && tag != LEADER_TAG && tag.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(MarcError::EncodingError(format!(
            "tag {tag:?} cannot be written as a sequential line"
        )))
    }
}

fn check_text(value: &str, tag: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(MarcError::EncodingError(format!(
            "field {tag}: value contains a line break"
        )));
    }
    Ok(())
}
