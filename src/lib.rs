#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! ## Library usage
//!
//! ### Converting a file
//!
//! ```no_run
//! use alephmarc::{convert, config::ConvertOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = convert(&ConvertOptions::new("records.seq", "records.mrc"))?;
//! println!("{} records written", report.records_written);
//! # Ok(())
//! # }
//! ```
//!
//! ### Decoding and encoding in memory
//!
//! ```
//! use alephmarc::{encode_record, AlephSequentialReader, Charset};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = "000000001 001   L 12345\n000000001 24510 L $$aTitle$$bSubtitle\n";
//! let mut reader = AlephSequentialReader::new(Cursor::new(text));
//!
//! let record = reader.read_record()?.unwrap();
//! let bytes = encode_record(&record, Charset::utf8())?;
//! assert_eq!(&bytes[0..5], b"00076");
//! assert_eq!(bytes.last(), Some(&0x1D));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`aleph_sequential`] — Aleph sequential reader and encoder
//! - [`writer`] — ISO 2709 encoder
//! - [`reader`] — ISO 2709 reader
//! - [`record`] — Record structures (`Record`, `Field`, `Subfield`)
//! - [`leader`] — MARC record leader (24-byte header)
//! - [`sink`] — Output file with guaranteed flush
//! - [`pipeline`] — Reader → encoder → sink driver
//! - [`encoding`] — Input and output charsets
//! - [`config`] — Command-line options and library configuration
//! - [`error`] — Error types and result type

pub mod aleph_sequential;
pub mod config;
pub mod convert;
pub mod encoding;
pub mod error;
/// The two serializations and the reader/encoder traits the pipeline runs on.
pub mod formats;
pub mod leader;
pub mod logger;
pub mod pipeline;
pub mod reader;
/// Core MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;
pub mod recovery;
pub mod sink;
pub mod writer;

pub use aleph_sequential::{AlephSequentialEncoder, AlephSequentialReader};
pub use convert::{convert, inspect_first};
pub use encoding::Charset;
pub use error::{MarcError, Result};
pub use formats::{Format, FormatReader, FormatReaderExt, RecordEncoder};
pub use leader::Leader;
pub use logger::init_logger;
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport, PipelineState, WriteMode};
pub use reader::MarcReader;
pub use record::{ControlField, Field, Record, Subfield, VariableField};
pub use recovery::RecoveryMode;
pub use sink::{OutputSink, SinkStats};
pub use writer::{encode_record, Iso2709Encoder};
