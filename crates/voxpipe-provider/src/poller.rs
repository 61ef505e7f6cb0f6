//! Polling state machine bridging submission and the terminal outcome
//!
//! The loop is written with an explicit attempt counter and a separate
//! wall-clock bound so both limits are enforced as independent, auditable
//! conditions. States are `POLLING` until either `DONE(text)` or
//! `FAILED(reason)`; there are no others.

use crate::client::TranscriptionProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{TranscriptId, TranscriptState};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use voxpipe_core::config::ProviderConfig;

/// Tunables for the poll loop
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay step; attempt N waits `step * N` before the next attempt
    pub interval_step: Duration,

    /// Cap on the per-attempt delay
    pub max_interval: Duration,

    /// Maximum non-terminal iterations
    pub max_attempts: u32,

    /// Wall-clock bound on the whole loop, all iterations combined
    pub timeout: Duration,
}

impl PollConfig {
    /// Linear ramp delay after attempt N (1-based): `min(step * N, cap)`
    ///
    /// Intentionally gentler than upload's exponential backoff, since
    /// polling is expected to take many iterations.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.interval_step.saturating_mul(attempt).min(self.max_interval)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_step: Duration::from_millis(2000),
            max_interval: Duration::from_millis(10_000),
            max_attempts: 60,
            timeout: Duration::from_secs(600),
        }
    }
}

impl From<&ProviderConfig> for PollConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            interval_step: Duration::from_millis(config.poll_interval_step_ms),
            max_interval: Duration::from_millis(config.poll_max_interval_ms),
            max_attempts: config.poll_max_attempts,
            timeout: config.poll_timeout(),
        }
    }
}

/// Terminal outcome of a completed poll loop
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Transcribed text; may legitimately be empty
    pub text: String,

    /// Provider confidence score, informational
    pub confidence: Option<f64>,
}

/// Drives repeated status fetches until a terminal state or exhaustion
#[derive(Debug, Clone, Copy)]
pub struct StatusPoller {
    config: PollConfig,
}

impl StatusPoller {
    /// Create a poller with the given tunables
    #[must_use]
    pub const fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Poll until the transcript completes, errors, or a bound is hit
    ///
    /// A failed status fetch is a transient condition: the loop logs it and
    /// continues, still counting the iteration against both bounds.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::TranscriptError`] when the provider reports failure
    /// - [`ProviderError::PollExhausted`] after the iteration cap
    /// - [`ProviderError::PollTimeout`] when the wall clock runs out
    pub async fn poll<P>(&self, provider: &P, id: &TranscriptId) -> ProviderResult<PollOutcome>
    where
        P: TranscriptionProvider + ?Sized,
    {
        timeout(self.config.timeout, self.run(provider, id))
            .await
            .map_err(|_| {
                warn!(transcript_id = %id, "Poll loop exceeded wall-clock bound");
                ProviderError::PollTimeout {
                    elapsed_secs: self.config.timeout.as_secs(),
                }
            })?
    }

    async fn run<P>(&self, provider: &P, id: &TranscriptId) -> ProviderResult<PollOutcome>
    where
        P: TranscriptionProvider + ?Sized,
    {
        for attempt in 1..=self.config.max_attempts {
            match provider.poll_status(id).await {
                Ok(status) => match status.state() {
                    TranscriptState::Completed => {
                        let text = status.text.unwrap_or_default();
                        if text.trim().is_empty() {
                            warn!(
                                transcript_id = %id,
                                attempt,
                                "Transcript completed with empty text"
                            );
                        }
                        debug!(
                            transcript_id = %id,
                            attempt,
                            confidence = status.confidence,
                            "Transcription completed"
                        );
                        return Ok(PollOutcome {
                            text,
                            confidence: status.confidence,
                        });
                    }
                    TranscriptState::Error => {
                        let detail = status
                            .error_detail
                            .unwrap_or_else(|| "unknown provider error".to_string());
                        return Err(ProviderError::transcript_error(detail));
                    }
                    state => {
                        debug!(transcript_id = %id, attempt, %state, "Transcription in progress");
                    }
                },
                // Transient: a network blip during a long poll must not fail
                // an otherwise-successful transcription.
                Err(e) => {
                    warn!(transcript_id = %id, attempt, error = %e, "Status fetch failed, will retry");
                }
            }

            if attempt < self.config.max_attempts {
                sleep(self.config.delay_for(attempt)).await;
            }
        }

        Err(ProviderError::PollExhausted {
            attempts: self.config.max_attempts,
        })
    }
}
