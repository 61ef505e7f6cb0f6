//! Per-job pipeline: fetch → upload → submit → poll
//!
//! The orchestrator's contract is that every accepted job produces exactly
//! one terminal [`TranscriptionResult`]; no stage fault escapes as an error.
//! The whole sequence runs under one backstop timeout on top of the stages'
//! own bounds.

use crate::blob::BlobFetcher;
use crate::error::{PipelineError, PipelineResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use voxpipe_core::{Job, TranscriptionResult};
use voxpipe_provider::{PollConfig, StatusPoller, TranscriptionProvider};

/// Drives one job at a time through the full transcription pipeline
#[derive(Clone)]
pub struct JobProcessor {
    fetcher: BlobFetcher,
    provider: Arc<dyn TranscriptionProvider>,
    poller: StatusPoller,
    job_timeout: Duration,
}

impl std::fmt::Debug for JobProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobProcessor")
            .field("job_timeout", &self.job_timeout)
            .finish_non_exhaustive()
    }
}

impl JobProcessor {
    /// Assemble a processor from its collaborators
    #[must_use]
    pub fn new(
        fetcher: BlobFetcher,
        provider: Arc<dyn TranscriptionProvider>,
        poll_config: PollConfig,
        job_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            provider,
            poller: StatusPoller::new(poll_config),
            job_timeout,
        }
    }

    /// Process a job to its terminal result
    ///
    /// Always returns a result sharing the job's correlation fields; every
    /// failure path is captured as data, never as a fault. Reprocessing the
    /// same job is safe: each run re-fetches, re-uploads, and re-submits.
    #[instrument(skip(self, job), fields(task_id = %job.task_id, audio_id = %job.audio_id))]
    pub async fn process(&self, job: &Job) -> TranscriptionResult {
        info!(chat_id = job.chat_id, kind = %job.kind, "Processing transcription job");

        match timeout(self.job_timeout, self.run(job)).await {
            Ok(Ok(text)) => {
                info!(chars = text.len(), "Job transcribed");
                TranscriptionResult::success(job, text)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Job failed");
                TranscriptionResult::failure(job, format!("Transcription failed: {e}"))
            }
            Err(_) => {
                let e = PipelineError::JobTimeout {
                    secs: self.job_timeout.as_secs(),
                };
                warn!(error = %e, "Job hit the outer backstop timeout");
                TranscriptionResult::failure(job, format!("Transcription failed: {e}"))
            }
        }
    }

    async fn run(&self, job: &Job) -> PipelineResult<String> {
        job.validate()
            .map_err(|e| PipelineError::invalid_job(e.to_string()))?;

        let audio = self.fetcher.get(&job.audio_id).await?;
        let handle = self.provider.upload(audio).await?;
        let transcript_id = self.provider.submit(&handle).await?;
        let outcome = self
            .poller
            .poll(self.provider.as_ref(), &transcript_id)
            .await?;

        Ok(outcome.text)
    }
}
