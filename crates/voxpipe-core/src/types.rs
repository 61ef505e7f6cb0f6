//! Job and result records shared across the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of audio asset a job refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioKind {
    /// Uploaded audio file
    AudioFile,
    /// Recorded voice message
    VoiceMessage,
    /// Round video note (audio track only)
    VideoNote,
}

impl Default for AudioKind {
    fn default() -> Self {
        Self::VoiceMessage
    }
}

impl std::fmt::Display for AudioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AudioFile => write!(f, "audio_file"),
            Self::VoiceMessage => write!(f, "voice_message"),
            Self::VideoNote => write!(f, "video_note"),
        }
    }
}

/// One unit of transcription work, consumed from the task queue
///
/// Jobs are immutable once created; the pipeline copies the correlation
/// fields into the terminal [`TranscriptionResult`] unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Caller-assigned unique id, used for correlation and logging
    pub task_id: String,

    /// Key of the audio asset in the blob store
    pub audio_id: String,

    /// Destination identifier, opaque to the pipeline
    pub chat_id: i64,

    /// Source URL the asset was originally fetched from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Creation timestamp, informational only
    pub created_at: DateTime<Utc>,

    /// Kind of audio asset
    #[serde(default)]
    pub kind: AudioKind,
}

impl Job {
    /// Create a voice-message job with a fresh task id
    pub fn voice(audio_id: impl Into<String>, chat_id: i64, audio_url: impl Into<String>) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            audio_id: audio_id.into(),
            chat_id,
            audio_url: Some(audio_url.into()),
            created_at: Utc::now(),
            kind: AudioKind::VoiceMessage,
        }
    }

    /// Create a job of the given kind with a fresh task id
    pub fn new(audio_id: impl Into<String>, chat_id: i64, kind: AudioKind) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            audio_id: audio_id.into(),
            chat_id,
            audio_url: None,
            created_at: Utc::now(),
            kind,
        }
    }

    /// Check the record invariant: `task_id` and `audio_id` are never empty
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] naming the offending field.
    pub fn validate(&self) -> crate::Result<()> {
        if self.task_id.trim().is_empty() {
            return Err(crate::Error::Validation {
                field: "task_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.audio_id.trim().is_empty() {
            return Err(crate::Error::Validation {
                field: "audio_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Terminal status of a processed job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    /// Transcription produced text
    Success,
    /// Transcription failed with a classified reason
    Failure,
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Terminal outcome for exactly one [`Job`], published to the result queue
///
/// Constructed once, never mutated. `text` is present iff the status is
/// [`ResultStatus::Success`]; `error_message` iff [`ResultStatus::Failure`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Task id copied from the job
    pub task_id: String,

    /// Audio id copied from the job; partition key on the result queue
    pub audio_id: String,

    /// Destination identifier copied from the job
    pub chat_id: i64,

    /// Terminal status
    pub status: ResultStatus,

    /// Transcribed text, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Human-readable failure reason, present on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Timestamp of the terminal decision
    pub processed_at: DateTime<Utc>,
}

impl TranscriptionResult {
    /// Build a success result from a job and its transcribed text
    pub fn success(job: &Job, text: impl Into<String>) -> Self {
        Self {
            task_id: job.task_id.clone(),
            audio_id: job.audio_id.clone(),
            chat_id: job.chat_id,
            status: ResultStatus::Success,
            text: Some(text.into()),
            error_message: None,
            processed_at: Utc::now(),
        }
    }

    /// Build a failure result from a job and a classified reason
    pub fn failure(job: &Job, error_message: impl Into<String>) -> Self {
        Self {
            task_id: job.task_id.clone(),
            audio_id: job.audio_id.clone(),
            chat_id: job.chat_id,
            status: ResultStatus::Failure,
            text: None,
            error_message: Some(error_message.into()),
            processed_at: Utc::now(),
        }
    }

    /// Whether this result carries text
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ResultStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_voice_job_fields() {
        let job = Job::voice("audio-1", 42, "https://example.org/voice.ogg");

        assert_eq!(job.audio_id, "audio-1");
        assert_eq!(job.chat_id, 42);
        assert_eq!(job.kind, AudioKind::VoiceMessage);
        assert!(!job.task_id.is_empty());
        assert!(job.audio_url.is_some());
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_job_task_ids_are_unique() {
        let a = Job::voice("audio-1", 1, "url");
        let b = Job::voice("audio-1", 1, "url");
        assert_ne!(a.task_id, b.task_id);
    }

    #[test]
    fn test_job_validation_rejects_empty_ids() {
        let mut job = Job::voice("audio-1", 1, "url");
        job.task_id = String::new();
        assert!(job.validate().is_err());

        let mut job = Job::voice("audio-1", 1, "url");
        job.audio_id = "   ".to_string();
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_success_result_copies_correlation_fields() {
        let job = Job::voice("audio-9", 77, "url");
        let result = TranscriptionResult::success(&job, "hello world");

        assert_eq!(result.task_id, job.task_id);
        assert_eq!(result.audio_id, job.audio_id);
        assert_eq!(result.chat_id, job.chat_id);
        assert_eq!(result.status, ResultStatus::Success);
        assert_eq!(result.text.as_deref(), Some("hello world"));
        assert!(result.error_message.is_none());
        assert!(result.is_success());
    }

    #[test]
    fn test_failure_result_carries_reason() {
        let job = Job::voice("audio-9", 77, "url");
        let result = TranscriptionResult::failure(&job, "upload failed after 3 attempts");

        assert_eq!(result.status, ResultStatus::Failure);
        assert!(result.text.is_none());
        assert_eq!(
            result.error_message.as_deref(),
            Some("upload failed after 3 attempts")
        );
        assert!(!result.is_success());
    }

    #[test]
    fn test_result_status_serialization() {
        let json = serde_json::to_string(&ResultStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let json = serde_json::to_string(&ResultStatus::Failure).unwrap();
        assert_eq!(json, "\"FAILURE\"");
    }

    #[test]
    fn test_result_round_trip() {
        let job = Job::new("audio-3", -100500, AudioKind::VideoNote);
        let result = TranscriptionResult::success(&job, "текст");

        let json = serde_json::to_string(&result).unwrap();
        let parsed: TranscriptionResult = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.task_id, result.task_id);
        assert_eq!(parsed.status, ResultStatus::Success);
        assert_eq!(parsed.text.as_deref(), Some("текст"));
    }

    #[test]
    fn test_audio_kind_display() {
        assert_eq!(format!("{}", AudioKind::VoiceMessage), "voice_message");
        assert_eq!(AudioKind::default(), AudioKind::VoiceMessage);
    }
}
