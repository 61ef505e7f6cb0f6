//! Error types for provider operations

use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while driving the transcription provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Upload was handed an empty payload
    #[error("Audio payload is empty")]
    EmptyAudio,

    /// Upload gave up after exhausting its retry budget
    #[error("Upload failed after {attempts} attempts")]
    UploadFailed {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Transcription submit gave up after exhausting its retry budget
    #[error("Transcription submit failed after {attempts} attempts")]
    SubmitFailed {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// A single status fetch failed on transport or deserialization
    ///
    /// Queued/processing statuses are valid responses, never this error.
    #[error("Status fetch failed: {message}")]
    StatusFetchFailed {
        /// Underlying failure description
        message: String,
    },

    /// The provider reported the transcript as errored
    #[error("Transcription error: {detail}")]
    TranscriptError {
        /// Provider-supplied error detail
        detail: String,
    },

    /// The poll loop reached its iteration cap without a terminal status
    #[error("Polling exhausted after {attempts} attempts")]
    PollExhausted {
        /// Non-terminal iterations performed
        attempts: u32,
    },

    /// The poll loop exceeded its wall-clock bound
    #[error("Polling timed out after {elapsed_secs} seconds")]
    PollTimeout {
        /// Configured bound in seconds
        elapsed_secs: u64,
    },

    /// The provider answered with an unexpected HTTP status
    #[error("Provider returned HTTP status {status}")]
    UnexpectedHttpStatus {
        /// Response status code
        status: u16,
    },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Create a status fetch failure
    pub fn status_fetch_failed(message: impl Into<String>) -> Self {
        Self::StatusFetchFailed {
            message: message.into(),
        }
    }

    /// Create a transcript error from the provider's detail string
    pub fn transcript_error(detail: impl Into<String>) -> Self {
        Self::TranscriptError {
            detail: detail.into(),
        }
    }

    /// Whether the error is a transient condition the poll loop tolerates
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StatusFetchFailed { .. } | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        let err = ProviderError::UploadFailed { attempts: 3 };
        assert_eq!(format!("{err}"), "Upload failed after 3 attempts");

        let err = ProviderError::SubmitFailed { attempts: 3 };
        assert_eq!(
            format!("{err}"),
            "Transcription submit failed after 3 attempts"
        );

        let err = ProviderError::transcript_error("bad audio");
        assert_eq!(format!("{err}"), "Transcription error: bad audio");

        let err = ProviderError::PollExhausted { attempts: 60 };
        assert_eq!(format!("{err}"), "Polling exhausted after 60 attempts");

        let err = ProviderError::PollTimeout { elapsed_secs: 600 };
        assert_eq!(format!("{err}"), "Polling timed out after 600 seconds");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::status_fetch_failed("connection reset").is_transient());
        assert!(!ProviderError::EmptyAudio.is_transient());
        assert!(!ProviderError::UploadFailed { attempts: 3 }.is_transient());
        assert!(!ProviderError::transcript_error("bad audio").is_transient());
        assert!(!ProviderError::PollExhausted { attempts: 60 }.is_transient());
    }

    #[test]
    fn test_helper_constructors() {
        let err = ProviderError::status_fetch_failed("timed out");
        assert!(matches!(err, ProviderError::StatusFetchFailed { .. }));
        assert!(format!("{err}").contains("timed out"));
    }
}
