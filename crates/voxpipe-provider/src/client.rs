//! HTTP client for the transcription provider
//!
//! Wraps the provider's three operations behind [`TranscriptionProvider`].
//! Upload and submit retry internally with exponential backoff and jitter;
//! status fetches are single-shot because retry policy for them belongs to
//! the polling state machine, where "transport hiccup" and "not ready yet"
//! are interpreted differently.

use crate::error::{ProviderError, ProviderResult};
use crate::types::{
    SubmitRequest, SubmitResponse, TranscriptId, TranscriptStatus, UploadHandle, UploadResponse,
};
use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use voxpipe_core::config::ProviderConfig;

/// Provider operations the pipeline depends on
///
/// All three are pure remote calls; no state is retained between calls
/// beyond the handle/id values threaded by the caller.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Upload raw audio bytes, returning the provider's handle to them
    async fn upload(&self, audio: Bytes) -> ProviderResult<UploadHandle>;

    /// Submit an uploaded asset for transcription
    async fn submit(&self, handle: &UploadHandle) -> ProviderResult<TranscriptId>;

    /// Fetch the current transcript status, single attempt, no retry
    async fn poll_status(&self, id: &TranscriptId) -> ProviderResult<TranscriptStatus>;
}

/// Exponential backoff schedule for a retried operation
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before giving up
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,

    /// Optional cap on the computed delay
    pub max_delay: Option<Duration>,
}

impl RetryPolicy {
    /// Create an uncapped policy
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: None,
        }
    }

    /// Cap the computed delay
    #[must_use]
    pub const fn with_cap(mut self, cap: Duration) -> Self {
        self.max_delay = Some(cap);
        self
    }

    /// Exact delay after a failed attempt N (1-based): `base * 2^(N-1)`, capped
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay = self.base_delay.saturating_mul(1_u32 << exponent);
        self.max_delay.map_or(delay, |cap| delay.min(cap))
    }

    /// [`Self::delay_for`] with ±50 % random jitter applied
    #[must_use]
    pub fn jittered_delay_for(&self, attempt: u32) -> Duration {
        let factor = rand::thread_rng().gen_range(0.5..=1.5);
        self.delay_for(attempt).mul_f64(factor)
    }
}

/// HTTP implementation of [`TranscriptionProvider`]
///
/// The underlying connection pool is shared and stateless, so one instance
/// can serve all workers concurrently.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    /// Shared HTTP client
    client: reqwest::Client,

    /// Provider API base URL, no trailing slash
    base_url: String,

    /// Static API key, attached to every request
    api_key: String,

    /// Target language for submit requests
    language_code: String,

    /// Retry schedule for uploads
    upload_retry: RetryPolicy,

    /// Retry schedule for submits
    submit_retry: RetryPolicy,
}

impl HttpProvider {
    /// Build a provider client from configuration
    ///
    /// The request timeout covers the whole call chain of each attempt, not
    /// just the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language_code: config.language_code.clone(),
            upload_retry: RetryPolicy::new(config.upload_max_attempts, config.upload_base_delay())
                .with_cap(config.upload_max_delay()),
            submit_retry: RetryPolicy::new(config.submit_max_attempts, config.submit_base_delay()),
        })
    }

    fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ProviderError::UnexpectedHttpStatus {
                status: response.status().as_u16(),
            })
        }
    }

    async fn upload_once(&self, audio: Bytes) -> ProviderResult<UploadHandle> {
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await?;

        let body: UploadResponse = Self::check_status(response)?.json().await?;
        Ok(UploadHandle::new(body.upload_url))
    }

    async fn submit_once(&self, handle: &UploadHandle) -> ProviderResult<TranscriptId> {
        let request = SubmitRequest {
            audio_url: handle.as_str(),
            language_code: &self.language_code,
        };

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
            .json(&request)
            .send()
            .await?;

        let body: SubmitResponse = Self::check_status(response)?.json().await?;
        Ok(TranscriptId::new(body.id))
    }

    async fn fetch_status(&self, id: &TranscriptId) -> ProviderResult<TranscriptStatus> {
        let response = self
            .client
            .get(format!("{}/transcript/{}", self.base_url, id.as_str()))
            .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
            .send()
            .await?;

        let status: TranscriptStatus = Self::check_status(response)?.json().await?;
        Ok(status)
    }
}

#[async_trait]
impl TranscriptionProvider for HttpProvider {
    async fn upload(&self, audio: Bytes) -> ProviderResult<UploadHandle> {
        if audio.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }

        let mut attempt = 1_u32;
        loop {
            match self.upload_once(audio.clone()).await {
                Ok(handle) => {
                    debug!(attempt, bytes = audio.len(), "Audio uploaded");
                    return Ok(handle);
                }
                Err(e) if attempt < self.upload_retry.max_attempts => {
                    let delay = self.upload_retry.jittered_delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upload attempt failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts = attempt, error = %e, "Upload failed, retries exhausted");
                    return Err(ProviderError::UploadFailed { attempts: attempt });
                }
            }
        }
    }

    async fn submit(&self, handle: &UploadHandle) -> ProviderResult<TranscriptId> {
        let mut attempt = 1_u32;
        loop {
            match self.submit_once(handle).await {
                Ok(id) => {
                    debug!(attempt, transcript_id = %id, "Transcription submitted");
                    return Ok(id);
                }
                Err(e) if attempt < self.submit_retry.max_attempts => {
                    let delay = self.submit_retry.jittered_delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Submit attempt failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts = attempt, error = %e, "Submit failed, retries exhausted");
                    return Err(ProviderError::SubmitFailed { attempts: attempt });
                }
            }
        }
    }

    async fn poll_status(&self, id: &TranscriptId) -> ProviderResult<TranscriptStatus> {
        self.fetch_status(id).await.map_err(|e| match e {
            already @ ProviderError::StatusFetchFailed { .. } => already,
            other => ProviderError::status_fetch_failed(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            language_code: "ru".to_string(),
            upload_max_attempts: 3,
            upload_base_delay_ms: 1,
            upload_max_delay_ms: 5,
            submit_max_attempts: 3,
            submit_base_delay_ms: 1,
            request_timeout_secs: 5,
            poll_interval_step_ms: 2000,
            poll_max_interval_ms: 10_000,
            poll_max_attempts: 60,
            poll_timeout_secs: 600,
            job_timeout_secs: 600,
        }
    }

    #[test]
    fn test_retry_policy_exponential_delays() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2)).with_cap(Duration::from_secs(10));

        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10)); // capped
        assert_eq!(policy.delay_for(10), Duration::from_secs(10));
    }

    #[test]
    fn test_retry_policy_uncapped() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_stays_within_half_delay() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2)).with_cap(Duration::from_secs(10));

        for attempt in 1..=4 {
            let exact = policy.delay_for(attempt);
            for _ in 0..100 {
                let jittered = policy.jittered_delay_for(attempt);
                assert!(jittered >= exact.mul_f64(0.5));
                assert!(jittered <= exact.mul_f64(1.5));
            }
        }
    }

    #[tokio::test]
    async fn test_upload_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("authorization", "test-key"))
            .and(header("content-type", "application/octet-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"upload_url": "https://cdn.provider/u/abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let handle = provider.upload(Bytes::from_static(b"ogg-bytes")).await.unwrap();

        assert_eq!(handle.as_str(), "https://cdn.provider/u/abc");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_payload() {
        let server = MockServer::start().await;
        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();

        let result = provider.upload(Bytes::new()).await;
        assert!(matches!(result, Err(ProviderError::EmptyAudio)));
    }

    #[tokio::test]
    async fn test_upload_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"upload_url": "https://cdn.provider/u/retry"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let handle = provider.upload(Bytes::from_static(b"ogg-bytes")).await.unwrap();

        assert_eq!(handle.as_str(), "https://cdn.provider/u/retry");
    }

    #[tokio::test]
    async fn test_upload_exhaustion_reports_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let result = provider.upload(Bytes::from_static(b"ogg-bytes")).await;

        assert!(matches!(
            result,
            Err(ProviderError::UploadFailed { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn test_submit_sends_language_and_audio_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcript"))
            .and(header("authorization", "test-key"))
            .and(body_json(json!({
                "audio_url": "https://cdn.provider/u/abc",
                "language_code": "ru"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "tr_42"})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let id = provider
            .submit(&UploadHandle::new("https://cdn.provider/u/abc"))
            .await
            .unwrap();

        assert_eq!(id.as_str(), "tr_42");
    }

    #[tokio::test]
    async fn test_submit_exhaustion_reports_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcript"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let result = provider.submit(&UploadHandle::new("https://cdn/u")).await;

        assert!(matches!(
            result,
            Err(ProviderError::SubmitFailed { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn test_poll_status_returns_wire_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript/tr_42"))
            .and(header("authorization", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "processing"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let status = provider.poll_status(&TranscriptId::new("tr_42")).await.unwrap();

        assert_eq!(status.state(), crate::types::TranscriptState::Processing);
    }

    #[tokio::test]
    async fn test_poll_status_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript/tr_42"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let result = provider.poll_status(&TranscriptId::new("tr_42")).await;

        assert!(matches!(
            result,
            Err(ProviderError::StatusFetchFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_poll_status_maps_bad_body_to_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcript/tr_42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&test_config(&server.uri())).unwrap();
        let result = provider.poll_status(&TranscriptId::new("tr_42")).await;

        assert!(matches!(
            result,
            Err(ProviderError::StatusFetchFailed { .. })
        ));
    }
}
