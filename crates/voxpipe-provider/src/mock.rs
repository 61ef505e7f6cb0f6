//! Mock transcription provider for testing
//!
//! Upload/submit outcomes are configured up front; poll responses are a
//! scripted FIFO. When the script runs dry the mock keeps answering
//! `processing`, which makes exhaustion scenarios trivial to stage.

use crate::client::TranscriptionProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{TranscriptId, TranscriptStatus, UploadHandle};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted poll response
#[derive(Debug, Clone)]
enum PollScript {
    /// Return this status
    Status(TranscriptStatus),
    /// Fail the fetch with a simulated transport error
    FetchError,
}

/// Scriptable in-memory [`TranscriptionProvider`]
///
/// Clones share the script and call counters, so a test can hand a clone to
/// the pipeline and inspect the counters afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    /// When set, uploads fail reporting this many attempts
    upload_failure: Option<u32>,

    /// When set, submits fail reporting this many attempts
    submit_failure: Option<u32>,

    /// Scripted poll responses, consumed front to back
    poll_script: Arc<Mutex<VecDeque<PollScript>>>,

    /// Upload call counter
    upload_calls: Arc<AtomicU32>,

    /// Submit call counter
    submit_calls: Arc<AtomicU32>,

    /// Poll call counter
    poll_calls: Arc<AtomicU32>,
}

impl MockProvider {
    /// Create a mock whose polls answer `processing` forever
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads fail as if `attempts` retries were exhausted
    #[must_use]
    pub const fn with_upload_failure(mut self, attempts: u32) -> Self {
        self.upload_failure = Some(attempts);
        self
    }

    /// Make submits fail as if `attempts` retries were exhausted
    #[must_use]
    pub const fn with_submit_failure(mut self, attempts: u32) -> Self {
        self.submit_failure = Some(attempts);
        self
    }

    /// Append a status to the poll script
    #[must_use]
    pub fn with_poll_status(self, status: TranscriptStatus) -> Self {
        self.poll_script
            .lock()
            .unwrap()
            .push_back(PollScript::Status(status));
        self
    }

    /// Append a simulated transport failure to the poll script
    #[must_use]
    pub fn with_poll_fetch_error(self) -> Self {
        self.poll_script
            .lock()
            .unwrap()
            .push_back(PollScript::FetchError);
        self
    }

    /// Number of upload calls made
    pub fn upload_calls(&self) -> u32 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Number of submit calls made
    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Number of poll calls made
    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionProvider for MockProvider {
    async fn upload(&self, audio: Bytes) -> ProviderResult<UploadHandle> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if audio.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }
        if let Some(attempts) = self.upload_failure {
            return Err(ProviderError::UploadFailed { attempts });
        }
        Ok(UploadHandle::new("mock://upload/audio"))
    }

    async fn submit(&self, _handle: &UploadHandle) -> ProviderResult<TranscriptId> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(attempts) = self.submit_failure {
            return Err(ProviderError::SubmitFailed { attempts });
        }
        Ok(TranscriptId::new("mock-transcript"))
    }

    async fn poll_status(&self, _id: &TranscriptId) -> ProviderResult<TranscriptStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.poll_script.lock().unwrap().pop_front();
        match next {
            Some(PollScript::Status(status)) => Ok(status),
            Some(PollScript::FetchError) => Err(ProviderError::status_fetch_failed(
                "simulated transport failure",
            )),
            None => Ok(TranscriptStatus::with_state("processing")),
        }
    }
}
