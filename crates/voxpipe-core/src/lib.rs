//! Core types and utilities for the voxpipe transcription pipeline
//!
//! This crate holds everything the pipeline crates share: the job and result
//! records that cross the queue boundary, the configuration surface, and the
//! logging bootstrap.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use types::{AudioKind, Job, ResultStatus, TranscriptionResult};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`, falling back to `info`, and emits
/// structured JSON events.
///
/// # Errors
///
/// Returns an error if the logging system cannot be initialized.
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| Error::Configuration {
            message: format!("Failed to initialize logging: {e}"),
        })
}
