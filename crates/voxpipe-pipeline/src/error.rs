//! Error types for pipeline operations

use crate::blob::BlobError;
use thiserror::Error;
use voxpipe_provider::ProviderError;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while driving a job through the pipeline
///
/// Everything except `Publish` is converted into a terminal FAILURE result
/// by the orchestrator; `Publish` instead suppresses acknowledgment so the
/// queue redelivers the job.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The job record violated an invariant
    #[error("Invalid job: {message}")]
    InvalidJob {
        /// What was wrong
        message: String,
    },

    /// Audio bytes could not be fetched from the blob store
    #[error("Blob fetch failed: {0}")]
    Fetch(#[from] BlobError),

    /// A provider stage failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The outer per-job backstop timeout fired
    #[error("Job timed out after {secs} seconds")]
    JobTimeout {
        /// Configured bound in seconds
        secs: u64,
    },

    /// The terminal result could not be handed to the result queue
    #[error("Result publish failed: {message}")]
    Publish {
        /// Underlying failure description
        message: String,
    },

    /// The job source is closed
    #[error("Job source closed")]
    QueueClosed,
}

impl PipelineError {
    /// Create a publish failure
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }

    /// Create an invalid-job error
    pub fn invalid_job(message: impl Into<String>) -> Self {
        Self::InvalidJob {
            message: message.into(),
        }
    }
}
