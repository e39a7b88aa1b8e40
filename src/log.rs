// src/log.rs
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{ExtractError, Result};
use crate::file::ensure_directory;

/// Install the global subscriber: one line per event (timestamp, level,
/// component, message) to stderr and appended to `log_file`.
///
/// `RUST_LOG` overrides `default_level` when set.
pub fn init(log_file: &Path, default_level: &str) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| ExtractError::persistence(log_file, e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| ExtractError::Config(format!("bad log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| ExtractError::Config(format!("logger already installed: {e}")))
}
