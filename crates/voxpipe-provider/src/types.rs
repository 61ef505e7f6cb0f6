//! Wire types for the transcription provider API

use serde::{Deserialize, Serialize};

/// Opaque handle to audio uploaded to the provider
///
/// Returned by the upload endpoint and consumed exactly once by submit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadHandle(String);

impl UploadHandle {
    /// Wrap a provider-issued upload URL/token
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The raw URL/token string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque transcript identifier, the poll key for one job's lifetime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TranscriptId(String);

impl TranscriptId {
    /// Wrap a provider-issued transcript id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized transcript state
///
/// The wire value is free-form text; [`TranscriptState::from_wire`] folds
/// case and maps anything unrecognized to [`TranscriptState::Unknown`],
/// which the poll loop treats as still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptState {
    /// Waiting in the provider's queue
    Queued,
    /// Being transcribed
    Processing,
    /// Transcription finished, text available
    Completed,
    /// Transcription failed on the provider side
    Error,
    /// Unrecognized wire value, treated as in progress
    Unknown,
}

impl TranscriptState {
    /// Normalize a wire status value, case-insensitively
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Whether this state ends the poll loop
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for TranscriptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Provider response to a status fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptStatus {
    /// Raw wire status value
    pub status: String,

    /// Transcribed text, present when completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Overall confidence in [0, 1], informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Provider error detail, present when errored
    #[serde(default, rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl TranscriptStatus {
    /// The normalized state for this response
    #[must_use]
    pub fn state(&self) -> TranscriptState {
        TranscriptState::from_wire(&self.status)
    }

    /// Build a bare status response, for tests and mocks
    pub fn with_state(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            text: None,
            confidence: None,
            error_detail: None,
        }
    }

    /// Build a completed response carrying text
    pub fn completed(text: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            status: "completed".to_string(),
            text: Some(text.into()),
            confidence,
            error_detail: None,
        }
    }

    /// Build an errored response carrying a detail message
    pub fn errored(detail: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            text: None,
            confidence: None,
            error_detail: Some(detail.into()),
        }
    }
}

/// Response body of the upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadResponse {
    pub upload_url: String,
}

/// Request body of the submit endpoint
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub audio_url: &'a str,
    pub language_code: &'a str,
}

/// Response body of the submit endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitResponse {
    pub id: String,
}
