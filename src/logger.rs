//! Logger initialization.

use log::LevelFilter;

/// Initializes `env_logger` writing to stderr.
///
/// The logger reads `RUST_LOG` first, then `level` overrides the global
/// filter. Per-module directives from `RUST_LOG` still apply.
///
/// # Errors
///
/// Returns an error if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Per-record debug output
/// convert records.seq records.mrc --log-level debug
///
/// # Only the reader's messages at trace level
/// RUST_LOG=alephmarc::aleph_sequential=trace convert records.seq records.mrc
/// ```
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis();

    // try_init so tests can call this more than once
    builder.try_init()
}
