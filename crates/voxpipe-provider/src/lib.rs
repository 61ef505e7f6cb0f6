//! Transcription provider client for the voxpipe pipeline
//!
//! Wraps the provider's three remote operations (upload, submit, poll-status)
//! with per-call timeout and retry policy, and drives the polling state
//! machine that bridges job submission and the terminal outcome.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::uninlined_format_args
)]

pub mod client;
pub mod error;
pub mod mock;
pub mod poller;
pub mod types;

pub use client::{HttpProvider, RetryPolicy, TranscriptionProvider};
pub use error::{ProviderError, ProviderResult};
pub use mock::MockProvider;
pub use poller::{PollConfig, PollOutcome, StatusPoller};
pub use types::{TranscriptId, TranscriptState, TranscriptStatus, UploadHandle};
