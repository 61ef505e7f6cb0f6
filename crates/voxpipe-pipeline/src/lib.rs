//! Job orchestration for the voxpipe transcription pipeline
//!
//! Composes blob fetch → upload → submit → poll into one pipeline per job,
//! guarantees exactly one terminal result per consumed job, and drives manual
//! queue acknowledgment from a bounded worker pool.

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
    clippy::uninlined_format_args
)]

pub mod blob;
pub mod emitter;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod worker;

pub use blob::{BlobError, BlobFetcher, BlobStore, MemoryBlobStore};
pub use emitter::ResultEmitter;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::JobProcessor;
pub use queue::{AckToken, JobDelivery, JobSource, MemoryJobQueue, MemoryResultSink, ResultSink};
pub use worker::WorkerPool;
