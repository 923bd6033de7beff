//! File-to-file conversion driven by [`ConvertOptions`].
//!
//! The input is opened before the output is created, so a missing input never
//! leaves an empty output file behind.

use crate::aleph_sequential::{AlephSequentialEncoder, AlephSequentialReader};
use crate::config::ConvertOptions;
use crate::error::{MarcError, Result};
use crate::formats::{Format, FormatReader, RecordEncoder};
use crate::pipeline::{Pipeline, PipelineReport};
use crate::reader::MarcReader;
use crate::record::Record;
use crate::recovery::RecoveryMode;
use crate::sink::OutputSink;
use crate::writer::Iso2709Encoder;
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;

/// Convert `options.input` into `options.output`.
///
/// # Errors
///
/// Returns [`MarcError::InputNotFound`] or [`MarcError::OutputUnwritable`] if a
/// file cannot be opened, and otherwise the first error of the run (see
/// [`Pipeline::run`]).
pub fn convert(options: &ConvertOptions) -> Result<PipelineReport> {
    let reader = open_reader(options)?;
    let sink = OutputSink::create(&options.output)?;
    info!(
        "{} ({}) -> {} ({})",
        options.from, options.input_charset, options.to, options.output_charset
    );

    Pipeline::new(options.pipeline.clone()).run(reader, encoder_for(options), sink)
}

/// Read only the first record of `options.input`.
///
/// Nothing is written; `options.output` is ignored.
///
/// # Errors
///
/// Returns [`MarcError::InputNotFound`] if the input cannot be opened, or the
/// reader's error for the first record.
pub fn inspect_first(options: &ConvertOptions) -> Result<Option<Record>> {
    open_reader(options)?.read_record()
}

fn open_reader(options: &ConvertOptions) -> Result<Box<dyn FormatReader + Send>> {
    let file = File::open(&options.input).map_err(|source| MarcError::InputNotFound {
        path: options.input.clone(),
        source,
    })?;
    let input = BufReader::new(file);

    Ok(match options.from {
        Format::AlephSequential => Box::new(
            AlephSequentialReader::new(input)
                .with_charset(options.input_charset)
                .with_recovery_mode(options.recovery_mode),
        ),
        Format::Iso2709 => {
            if options.recovery_mode == RecoveryMode::Lenient {
                warn!("lenient mode has no effect on ISO 2709 input");
            }
            Box::new(MarcReader::new(input).with_charset(options.input_charset))
        },
    })
}

fn encoder_for(options: &ConvertOptions) -> Box<dyn RecordEncoder + Send> {
    match options.to {
        Format::AlephSequential => Box::new(AlephSequentialEncoder::new(options.output_charset)),
        Format::Iso2709 => Box::new(Iso2709Encoder::new(options.output_charset)),
    }
}
