//! Publishes terminal results to the result queue

use crate::error::PipelineResult;
use crate::queue::ResultSink;
use std::sync::Arc;
use tracing::{error, info};
use voxpipe_core::TranscriptionResult;

/// Hands terminal results to the result queue, keyed by audio id
///
/// Keying by `audio_id` keeps every result for the same asset on one
/// partition/ordering domain when the transport has one. Publish failures
/// are logged with full context and surfaced to the caller, which withholds
/// the inbound acknowledgment so the queue redelivers the job.
#[derive(Clone)]
pub struct ResultEmitter {
    sink: Arc<dyn ResultSink>,
}

impl std::fmt::Debug for ResultEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultEmitter").finish_non_exhaustive()
    }
}

impl ResultEmitter {
    /// Wrap a result sink
    #[must_use]
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self { sink }
    }

    /// Publish one terminal result
    ///
    /// # Errors
    ///
    /// Propagates the sink's publish error after logging it.
    pub async fn emit(&self, result: &TranscriptionResult) -> PipelineResult<()> {
        match self.sink.publish(&result.audio_id, result).await {
            Ok(()) => {
                info!(
                    task_id = %result.task_id,
                    audio_id = %result.audio_id,
                    status = %result.status,
                    "Result published"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    task_id = %result.task_id,
                    audio_id = %result.audio_id,
                    error = %e,
                    "Failed to publish result"
                );
                Err(e)
            }
        }
    }
}
