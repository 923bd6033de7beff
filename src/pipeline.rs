//! Conversion pipeline: reader, encoder and sink in strict record order.
//!
//! A [`Pipeline`] runs once. It pulls records from a [`FormatReader`], turns
//! each into bytes with a [`RecordEncoder`] and appends them to an
//! [`OutputSink`]. The sink is finished on every exit path, so a failed run
//! leaves an output holding only the complete records written before the
//! failure.
//!
//! Three [`WriteMode`]s are available:
//! - **Streaming:** read, encode, write, one record at a time
//! - **Buffered:** encode everything first, write after end of input
//! - **Channel:** a producer thread reads and encodes into a bounded channel;
//!   the calling thread drains it into the sink. The channel capacity blocks
//!   the producer when the sink falls behind.

use crate::error::{MarcError, Result};
use crate::formats::{FormatReader, RecordEncoder};
use crate::sink::OutputSink;
use crossbeam_channel::{bounded, Sender};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::thread;

/// Default capacity of the channel in [`WriteMode::Channel`], in records.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// How encoded records reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write each record as soon as it is encoded
    #[default]
    Streaming,
    /// Hold every encoded record until the input is exhausted
    Buffered,
    /// Decode and encode on a producer thread feeding a bounded channel
    Channel,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteMode::Streaming => "streaming",
            WriteMode::Buffered => "buffered",
            WriteMode::Channel => "channel",
        };
        f.write_str(name)
    }
}

/// Configuration for a [`Pipeline`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Write mode
    pub mode: WriteMode,
    /// Channel capacity (records), used in [`WriteMode::Channel`]
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: WriteMode::Streaming,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Lifecycle of a pipeline run.
///
/// `Idle → Reading ⇄ Encoding → Finalizing → Done`, with `Failed` reachable
/// from any non-terminal state.
///
/// In [`WriteMode::Channel`] the state follows the calling thread: `Reading`
/// while it waits on the channel, `Encoding` while it writes a record the
/// producer already encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Pulling the next record from the reader
    Reading,
    /// Encoding or writing a record
    Encoding,
    /// Flushing and closing the sink
    Finalizing,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

impl PipelineState {
    /// Returns true for `Done` and `Failed`
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// Totals of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PipelineReport {
    /// Records produced by the reader
    pub records_read: usize,
    /// Records appended to the sink
    pub records_written: usize,
    /// Bytes appended to the sink
    pub bytes_written: u64,
}

/// Single-use conversion pipeline.
///
/// # Examples
///
/// ```no_run
/// use alephmarc::{AlephSequentialReader, Charset, Iso2709Encoder, OutputSink, Pipeline, PipelineConfig};
/// use std::fs::File;
/// use std::io::BufReader;
///
/// let reader = AlephSequentialReader::new(BufReader::new(File::open("records.seq")?));
/// let sink = OutputSink::create("records.mrc")?;
///
/// let mut pipeline = Pipeline::new(PipelineConfig::default());
/// let report = pipeline.run(reader, Iso2709Encoder::new(Charset::utf8()), sink)?;
/// println!("{} records", report.records_written);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    state: PipelineState,
}

impl Pipeline {
    /// Create an idle pipeline
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            state: PipelineState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The configuration this pipeline runs with
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn transition(&mut self, next: PipelineState) -> Result<()> {
        if self.state.is_terminal() {
            return Err(MarcError::InvalidState(format!(
                "cannot move from {:?} to {next:?}",
                self.state
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Convert every record from `reader` into `sink`.
    ///
    /// The first read, encode or write error stops the run. The sink is
    /// finished before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidState`] if the pipeline already ran, and
    /// otherwise the first error raised by the reader, the encoder or the sink.
    pub fn run<R, E>(
        &mut self,
        mut reader: R,
        mut encoder: E,
        mut sink: OutputSink,
    ) -> Result<PipelineReport>
    where
        R: FormatReader + Send,
        E: RecordEncoder + Send,
    {
        if self.state != PipelineState::Idle {
            return Err(MarcError::InvalidState(format!(
                "pipeline cannot run again from {:?}",
                self.state
            )));
        }
        info!(
            "converting into {} ({} mode)",
            sink.path().display(),
            self.config.mode
        );

        let outcome = match self.config.mode {
            WriteMode::Streaming => self.run_streaming(&mut reader, &mut encoder, &mut sink),
            WriteMode::Buffered => self.run_buffered(&mut reader, &mut encoder, &mut sink),
            WriteMode::Channel => self.run_channel(reader, encoder, &mut sink),
        };

        match outcome {
            Ok(records_read) => {
                self.transition(PipelineState::Finalizing)?;
                match sink.finish() {
                    Ok(stats) => {
                        self.transition(PipelineState::Done)?;
                        info!(
                            "wrote {} records ({} bytes)",
                            stats.records_written, stats.bytes_written
                        );
                        Ok(PipelineReport {
                            records_read,
                            records_written: stats.records_written,
                            bytes_written: stats.bytes_written,
                        })
                    },
                    Err(e) => {
                        self.state = PipelineState::Failed;
                        Err(e)
                    },
                }
            },
            Err(e) => {
                self.state = PipelineState::Failed;
                let kept = sink.stats().records_written;
                if let Err(finish_error) = sink.finish() {
                    warn!("failed to close output after error: {finish_error}");
                }
                debug!("run failed after writing {kept} records");
                Err(e)
            },
        }
    }

    fn run_streaming<R, E>(
        &mut self,
        reader: &mut R,
        encoder: &mut E,
        sink: &mut OutputSink,
    ) -> Result<usize>
    where
        R: FormatReader,
        E: RecordEncoder,
    {
        let mut records_read = 0;
        loop {
            self.transition(PipelineState::Reading)?;
            let Some(record) = reader.read_record()? else {
                return Ok(records_read);
            };
            records_read += 1;

            self.transition(PipelineState::Encoding)?;
            let bytes = encoder
                .encode(&record)
                .map_err(|e| at_record(e, records_read))?;
            sink.write_encoded(&bytes)?;
            debug!("record {records_read}: {} bytes", bytes.len());
        }
    }

    fn run_buffered<R, E>(
        &mut self,
        reader: &mut R,
        encoder: &mut E,
        sink: &mut OutputSink,
    ) -> Result<usize>
    where
        R: FormatReader,
        E: RecordEncoder,
    {
        let mut encoded = Vec::new();
        loop {
            self.transition(PipelineState::Reading)?;
            let Some(record) = reader.read_record()? else {
                break;
            };

            self.transition(PipelineState::Encoding)?;
            let bytes = encoder
                .encode(&record)
                .map_err(|e| at_record(e, encoded.len() + 1))?;
            encoded.push(bytes);
        }

        debug!("input exhausted, writing {} buffered records", encoded.len());
        for bytes in &encoded {
            sink.write_encoded(bytes)?;
        }
        Ok(encoded.len())
    }

    fn run_channel<R, E>(&mut self, reader: R, encoder: E, sink: &mut OutputSink) -> Result<usize>
    where
        R: FormatReader + Send,
        E: RecordEncoder + Send,
    {
        self.transition(PipelineState::Reading)?;
        let (sender, receiver) = bounded(self.config.channel_capacity);

        thread::scope(|scope| {
            let producer = scope.spawn(move || produce(reader, encoder, &sender));

            let mut outcome = Ok(());
            for message in &receiver {
                let written = message.and_then(|bytes: Vec<u8>| {
                    self.transition(PipelineState::Encoding)?;
                    sink.write_encoded(&bytes)?;
                    self.transition(PipelineState::Reading)
                });
                if let Err(e) = written {
                    outcome = Err(e);
                    break;
                }
            }
            // Unblocks a producer waiting on a full channel
            drop(receiver);

            let records_read = producer
                .join()
                .map_err(|_| MarcError::InvalidState("producer thread panicked".to_string()))?;
            outcome.map(|()| records_read)
        })
    }
}

/// Producer side of [`WriteMode::Channel`]. Returns the number of records read.
fn produce<R, E>(mut reader: R, mut encoder: E, sender: &Sender<Result<Vec<u8>>>) -> usize
where
    R: FormatReader,
    E: RecordEncoder,
{
    let mut records_read = 0;
    loop {
        let message = match reader.read_record() {
            Ok(Some(record)) => {
                records_read += 1;
                encoder
                    .encode(&record)
                    .map_err(|e| at_record(e, records_read))
            },
            Ok(None) => break,
            Err(e) => Err(e),
        };
        let failed = message.is_err();
        // A closed channel means the consumer gave up
        if sender.send(message).is_err() || failed {
            break;
        }
    }
    records_read
}

/// Attach the 1-based record position to an encoding error.
fn at_record(error: MarcError, position: usize) -> MarcError {
    match error {
        MarcError::EncodingError(message) => {
            MarcError::EncodingError(format!("record {position}: {message}"))
        },
        other => other,
    }
}
