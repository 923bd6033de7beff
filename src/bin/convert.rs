//! CLI entry point: convert Aleph sequential records to ISO 2709.
//!
//! Usage:
//!   convert <input.seq> <output.mrc>
//!   convert --from iso2709 --to aleph-seq <input.mrc> <output.seq>
//!
//! Exits with 1 on missing arguments, unreadable input, or any conversion
//! failure.

use alephmarc::config::{ConvertConfig, ConvertOptions};
use alephmarc::{convert, init_logger, inspect_first};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use log::{error, info};
use std::process;

fn main() -> Result<()> {
    let config = match ConvertConfig::try_parse() {
        Ok(config) => config,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // clap exits with 2 on usage errors
            let _ = e.print();
            process::exit(1);
        },
    };

    init_logger(config.log_level.into()).context("Failed to initialize logger")?;

    if let Err(e) = run(&config) {
        error!("convert failed: {e:#}");
        process::exit(1);
    }
    Ok(())
}

fn run(config: &ConvertConfig) -> Result<()> {
    let options = ConvertOptions::try_from(config).context("Invalid options")?;

    if config.inspect_first {
        let record = inspect_first(&options)
            .with_context(|| format!("Failed to read {}", options.input.display()))?;
        match record {
            Some(record) => info!(
                "first record:\n{}",
                serde_json::to_string_pretty(&record).context("Failed to render record")?
            ),
            None => info!("{} holds no records", options.input.display()),
        }
        return Ok(());
    }

    let report = convert(&options).with_context(|| {
        format!(
            "Failed to convert {} to {}",
            options.input.display(),
            options.output.display()
        )
    })?;
    info!(
        "converted {} of {} records into {}",
        report.records_written,
        report.records_read,
        options.output.display()
    );
    Ok(())
}
