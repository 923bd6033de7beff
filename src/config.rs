//! Command-line options and the library configuration they map to.
//!
//! [`ConvertConfig`] is what `clap` parses. [`ConvertOptions`] is the
//! CLI-free configuration the library runs on; build it directly or with
//! `ConvertOptions::try_from(&config)`.

use crate::encoding::Charset;
use crate::error::{MarcError, Result};
use crate::formats::Format;
use crate::pipeline::{PipelineConfig, WriteMode, DEFAULT_CHANNEL_CAPACITY};
use crate::recovery::RecoveryMode;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Logging level for the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Record serialization named on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Aleph sequential text
    AlephSeq,
    /// ISO 2709 binary
    Iso2709,
}

impl From<FormatArg> for Format {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::AlephSeq => Format::AlephSequential,
            FormatArg::Iso2709 => Format::Iso2709,
        }
    }
}

/// Write mode named on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Write each record as soon as it is encoded
    Streaming,
    /// Encode the whole input before writing
    Buffered,
    /// Decode on a producer thread feeding a bounded channel
    Channel,
}

impl From<ModeArg> for WriteMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Streaming => WriteMode::Streaming,
            ModeArg::Buffered => WriteMode::Buffered,
            ModeArg::Channel => WriteMode::Channel,
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Aleph sequential to ISO 2709
/// convert records.seq records.mrc
///
/// # Latin-1 export, skipping malformed lines
/// convert -e iso-8859-1 --lenient records.seq records.mrc
///
/// # Back from ISO 2709 to sequential text (formats follow the extensions)
/// convert records.mrc records.seq
///
/// # Same, for files without telling extensions
/// convert --from iso2709 --to aleph-seq records.bin records.txt
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "convert",
    version,
    about = "Converts Aleph sequential records into MARC21 ISO 2709 binary records."
)]
pub struct ConvertConfig {
    /// File to read
    #[arg(value_parser)]
    pub input: PathBuf,

    /// File to write (created or truncated)
    #[arg(value_parser)]
    pub output: PathBuf,

    /// Charset of the input (WHATWG label, e.g. utf-8, iso-8859-1)
    #[arg(short = 'e', long, default_value = "utf-8")]
    pub input_encoding: String,

    /// Charset of the output field data
    #[arg(long, default_value = "utf-8")]
    pub output_encoding: String,

    /// Input format: aleph-seq|iso2709 [default: from the input extension, else aleph-seq]
    #[arg(long, value_enum)]
    pub from: Option<FormatArg>,

    /// Output format: iso2709|aleph-seq [default: from the output extension, else iso2709]
    #[arg(long, value_enum)]
    pub to: Option<FormatArg>,

    /// Write mode: streaming|buffered|channel
    #[arg(long, value_enum, default_value_t = ModeArg::Streaming)]
    pub mode: ModeArg,

    /// Records held in the channel before the reader blocks (channel mode)
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Skip malformed sequential lines with a warning instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Log the first record as JSON and exit without writing output
    #[arg(long)]
    pub inspect_first: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// Library configuration for one conversion (no CLI dependencies).
///
/// # Examples
///
/// ```
/// use alephmarc::config::ConvertOptions;
/// use alephmarc::formats::Format;
///
/// let options = ConvertOptions::new("records.seq", "records.mrc");
/// assert_eq!(options.from, Format::AlephSequential);
/// assert_eq!(options.to, Format::Iso2709);
/// ```
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// File to read
    pub input: PathBuf,
    /// File to write
    pub output: PathBuf,
    /// Input format
    pub from: Format,
    /// Output format
    pub to: Format,
    /// Charset of the input
    pub input_charset: Charset,
    /// Charset of the output
    pub output_charset: Charset,
    /// Policy for malformed sequential lines
    pub recovery_mode: RecoveryMode,
    /// Pipeline settings
    pub pipeline: PipelineConfig,
}

impl ConvertOptions {
    /// Sequential-to-ISO 2709 conversion in UTF-8 with default settings
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ConvertOptions {
            input: input.into(),
            output: output.into(),
            from: Format::AlephSequential,
            to: Format::Iso2709,
            input_charset: Charset::utf8(),
            output_charset: Charset::utf8(),
            recovery_mode: RecoveryMode::Strict,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl TryFrom<&ConvertConfig> for ConvertOptions {
    type Error = MarcError;

    fn try_from(config: &ConvertConfig) -> Result<Self> {
        if config.channel_capacity == 0 {
            return Err(MarcError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }

        Ok(ConvertOptions {
            input: config.input.clone(),
            output: config.output.clone(),
            from: resolve_format(config.from, &config.input, Format::AlephSequential),
            to: resolve_format(config.to, &config.output, Format::Iso2709),
            input_charset: Charset::for_input(&config.input_encoding)?,
            output_charset: Charset::for_output(&config.output_encoding)?,
            recovery_mode: if config.lenient {
                RecoveryMode::Lenient
            } else {
                RecoveryMode::Strict
            },
            pipeline: PipelineConfig {
                mode: config.mode.into(),
                channel_capacity: config.channel_capacity,
            },
        })
    }
}

/// An explicit format wins, then the file extension, then `default`.
fn resolve_format(arg: Option<FormatArg>, path: &Path, default: Format) -> Format {
    arg.map(Format::from)
        .or_else(|| Format::from_path(path))
        .unwrap_or(default)
}
