//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the resolved `logging` group
//! - Pick the sink: stderr, or an append-only file when `file_path` is set
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `json` format for machine consumption, `text` for humans
//! - `RUST_LOG` overrides the configured level when present

use std::fs::OpenOptions;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::schema::{LogFormat, LogLevel};
use crate::config::Snapshot;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Filter for `level`, unless `RUST_LOG` says otherwise.
pub fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global subscriber described by `snapshot`.
pub fn init(snapshot: &Snapshot) -> Result<(), LoggingError> {
    let file_path = snapshot.document().logging.file_path.as_str();
    let writer = if file_path.is_empty() {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .map_err(|source| LoggingError::File {
                path: file_path.to_string(),
                source,
            })?;
        BoxMakeWriter::new(Mutex::new(file))
    };

    let registry = tracing_subscriber::registry().with(filter_for(snapshot.log_level()));
    match snapshot.log_format() {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_ansi(file_path.is_empty()).with_writer(writer))
            .try_init()?,
    }
    Ok(())
}
