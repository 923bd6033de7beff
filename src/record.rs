//! MARC record structures and operations.
//!
//! This module provides the core record types shared by every reader and writer:
//! - [`Record`] — A leader plus an ordered list of variable fields
//! - [`VariableField`] — Either a [`ControlField`] or a data [`Field`]
//! - [`Field`] — Variable data field with indicators and subfields
//! - [`Subfield`] — Named data element within a data field
//!
//! Unlike a tag-indexed map, a [`Record`] keeps every field in the exact
//! position it was read or added, so a record that lists `245` before `001`
//! is written back out in that order.
//!
//! # Examples
//!
//! ```
//! use alephmarc::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::default())
//!     .control_field_str("001", "12345")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Title")
//!             .subfield_str('b', "Subtitle")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.get_control_field("001"), Some("12345"));
//! assert_eq!(record.get_field("245").and_then(|f| f.get_subfield('b')), Some("Subtitle"));
//! ```

use crate::leader::Leader;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Returns true if `tag` names a control field.
///
/// Control fields are `001`-`009` plus the Aleph format tag `FMT`; they carry
/// a single value and no indicators or subfields.
#[must_use]
pub fn is_control_tag(tag: &str) -> bool {
    match tag.as_bytes() {
        [b'0', b'0', digit] => digit.is_ascii_digit(),
        _ => tag == "FMT",
    }
}

/// A MARC record
///
/// Fields are stored in a single ordered list regardless of kind or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record leader (24 bytes)
    pub leader: Leader,
    /// Control and data fields in record order
    pub fields: Vec<VariableField>,
}

/// One entry of a record's field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableField {
    /// Control field (001-009, FMT)
    Control(ControlField),
    /// Data field with indicators and subfields
    Data(Field),
}

/// A control field: a tag and an unstructured value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlField {
    /// Field tag (3 characters)
    pub tag: String,
    /// Field value
    pub value: String,
}

/// A data field in a MARC record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field tag (3 characters)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields (stored in `SmallVec` to avoid allocation for typical fields with 4 or fewer subfields)
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield value
    pub value: String,
}

impl Record {
    /// Create a new MARC record with the given leader
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            fields: Vec::new(),
        }
    }

    /// Create a builder for fluently constructing MARC records
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// Append a control field
    pub fn add_control_field(&mut self, tag: String, value: String) {
        self.fields.push(VariableField::Control(ControlField { tag, value }));
    }

    /// Append a control field using string slices
    pub fn add_control_field_str(&mut self, tag: &str, value: &str) {
        self.add_control_field(tag.to_string(), value.to_string());
    }

    /// Append a data field
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(VariableField::Data(field));
    }

    /// Append a field of either kind
    pub fn push(&mut self, field: VariableField) {
        self.fields.push(field);
    }

    /// Get the first control field value with the given tag
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields_iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, value)| value)
    }

    /// Get first data field with a given tag
    #[must_use]
    pub fn get_field(&self, tag: &str) -> Option<&Field> {
        self.fields().find(|field| field.tag == tag)
    }

    /// Iterate over all data fields in record order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter_map(VariableField::as_data)
    }

    /// Iterate over data fields matching a specific tag
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields().filter(move |field| field.tag == tag)
    }

    /// Iterate over all control fields as (tag, value) tuples
    pub fn control_fields_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(VariableField::as_control)
            .map(|cf| (cf.tag.as_str(), cf.value.as_str()))
    }

    /// Iterate over every field, control and data, in record order
    pub fn variable_fields(&self) -> std::slice::Iter<'_, VariableField> {
        self.fields.iter()
    }

    /// The control number (001), if present
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.get_control_field("001")
    }

    /// Number of fields of either kind
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl VariableField {
    /// The field tag
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            VariableField::Control(cf) => &cf.tag,
            VariableField::Data(f) => &f.tag,
        }
    }

    /// Returns true for control fields
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, VariableField::Control(_))
    }

    /// The control field, if this is one
    #[must_use]
    pub fn as_control(&self) -> Option<&ControlField> {
        match self {
            VariableField::Control(cf) => Some(cf),
            VariableField::Data(_) => None,
        }
    }

    /// The data field, if this is one
    #[must_use]
    pub fn as_data(&self) -> Option<&Field> {
        match self {
            VariableField::Data(f) => Some(f),
            VariableField::Control(_) => None,
        }
    }
}

impl From<Field> for VariableField {
    fn from(field: Field) -> Self {
        VariableField::Data(field)
    }
}

impl From<ControlField> for VariableField {
    fn from(field: ControlField) -> Self {
        VariableField::Control(field)
    }
}

/// Builder for fluently constructing MARC records
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field
    #[must_use]
    pub fn control_field(mut self, tag: String, value: String) -> Self {
        self.record.add_control_field(tag, value);
        self
    }

    /// Add a control field using string slices
    #[must_use]
    pub fn control_field_str(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field_str(tag, value);
        self
    }

    /// Add a data field
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Build the record
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Create a new data field
    #[must_use]
    pub fn new(tag: String, indicator1: char, indicator2: char) -> Self {
        Field {
            tag,
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for fluently constructing fields
    #[must_use]
    pub fn builder(tag: String, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag, indicator1, indicator2),
        }
    }

    /// Add a subfield
    pub fn add_subfield(&mut self, code: char, value: String) {
        self.subfields.push(Subfield { code, value });
    }

    /// Add a subfield using a string slice
    pub fn add_subfield_str(&mut self, code: char, value: &str) {
        self.add_subfield(code, value.to_string());
    }

    /// Get all values for a subfield code
    #[must_use]
    pub fn get_subfield_values(&self, code: char) -> Vec<&str> {
        self.subfields_by_code(code).collect()
    }

    /// Get first subfield value for a code
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields_by_code(code).next()
    }

    /// Iterate over all subfields in order
    pub fn subfields(&self) -> impl Iterator<Item = &Subfield> {
        self.subfields.iter()
    }

    /// Iterate over values of subfields with a specific code
    pub fn subfields_by_code(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }
}

/// Builder for fluently constructing MARC fields
///
/// # Examples
///
/// ```
/// use alephmarc::Field;
///
/// let field = Field::builder("245".to_string(), '1', '0')
///     .subfield('a', "Title".to_string())
///     .subfield('b', "Subtitle".to_string())
///     .build();
/// assert_eq!(field.subfields.len(), 2);
/// ```
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield to the field being built
    #[must_use]
    pub fn subfield(mut self, code: char, value: String) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    /// Add a subfield using a string slice
    #[must_use]
    pub fn subfield_str(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield_str(code, value);
        self
    }

    /// Build the field
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}
