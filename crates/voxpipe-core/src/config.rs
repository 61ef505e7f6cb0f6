//! Configuration management for the voxpipe pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcription provider configuration
    pub provider: ProviderConfig,

    /// Blob storage configuration
    pub storage: StorageConfig,

    /// Task/result queue configuration
    pub queue: QueueConfig,

    /// Worker pool configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transcription provider configuration
///
/// Timeouts and retry counts default to the values the pipeline is specified
/// against; they are exposed so tests can shrink them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API base URL
    pub base_url: String,

    /// Static API key, attached to every request
    pub api_key: String,

    /// Target language code for transcription requests
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Maximum upload attempts
    #[serde(default = "default_upload_max_attempts")]
    pub upload_max_attempts: u32,

    /// Upload backoff base delay in milliseconds
    #[serde(default = "default_upload_base_delay_ms")]
    pub upload_base_delay_ms: u64,

    /// Upload backoff delay cap in milliseconds
    #[serde(default = "default_upload_max_delay_ms")]
    pub upload_max_delay_ms: u64,

    /// Maximum submit attempts
    #[serde(default = "default_submit_max_attempts")]
    pub submit_max_attempts: u32,

    /// Submit backoff base delay in milliseconds
    #[serde(default = "default_submit_base_delay_ms")]
    pub submit_base_delay_ms: u64,

    /// Per-attempt request timeout in seconds, covering the whole call chain
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Poll delay step in milliseconds; attempt N waits `step * N`
    #[serde(default = "default_poll_interval_step_ms")]
    pub poll_interval_step_ms: u64,

    /// Poll delay cap in milliseconds
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// Maximum non-terminal poll iterations
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Wall-clock bound on the whole poll loop, in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Outer backstop timeout on a whole job, in seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage endpoint URL
    pub endpoint: String,

    /// Bucket holding audio assets
    pub bucket: String,

    /// Size of the bounded pool for blocking fetches
    #[serde(default = "default_fetch_pool_size")]
    pub fetch_pool_size: usize,
}

/// Task/result queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue bootstrap addresses
    pub bootstrap_servers: String,

    /// Topic the pipeline consumes jobs from
    #[serde(default = "default_task_topic")]
    pub task_topic: String,

    /// Topic the pipeline publishes results to
    #[serde(default = "default_result_topic")]
    pub result_topic: String,

    /// Consumer group identity
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers; one job in flight per worker slot
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Bound of the in-process job channel
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_depth: default_queue_depth(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_language_code() -> String {
    "ru".to_string()
}

const fn default_upload_max_attempts() -> u32 {
    3
}

const fn default_upload_base_delay_ms() -> u64 {
    2000
}

const fn default_upload_max_delay_ms() -> u64 {
    10_000
}

const fn default_submit_max_attempts() -> u32 {
    3
}

const fn default_submit_base_delay_ms() -> u64 {
    1000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_poll_interval_step_ms() -> u64 {
    2000
}

const fn default_poll_max_interval_ms() -> u64 {
    10_000
}

const fn default_poll_max_attempts() -> u32 {
    60
}

const fn default_poll_timeout_secs() -> u64 {
    600
}

const fn default_job_timeout_secs() -> u64 {
    600
}

const fn default_fetch_pool_size() -> usize {
    4
}

fn default_task_topic() -> String {
    "audio.transcription.requests".to_string()
}

fn default_result_topic() -> String {
    "audio.transcription.results".to_string()
}

fn default_consumer_group() -> String {
    "voxpipe".to_string()
}

const fn default_concurrency() -> usize {
    3
}

const fn default_queue_depth() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl ProviderConfig {
    /// Per-attempt request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Wall-clock bound on the poll loop
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Outer backstop timeout on a whole job
    #[must_use]
    pub const fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Upload backoff base delay
    #[must_use]
    pub const fn upload_base_delay(&self) -> Duration {
        Duration::from_millis(self.upload_base_delay_ms)
    }

    /// Upload backoff delay cap
    #[must_use]
    pub const fn upload_max_delay(&self) -> Duration {
        Duration::from_millis(self.upload_max_delay_ms)
    }

    /// Submit backoff base delay
    #[must_use]
    pub const fn submit_base_delay(&self) -> Duration {
        Duration::from_millis(self.submit_base_delay_ms)
    }
}

impl Config {
    /// Load configuration from environment and files
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("VOXPIPE").separator("_"))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                base_url: std::env::var("VOXPIPE_PROVIDER_BASE_URL")
                    .unwrap_or_else(|_| "https://api.assemblyai.com/v2".to_string()),
                api_key: std::env::var("VOXPIPE_PROVIDER_API_KEY").unwrap_or_default(),
                language_code: default_language_code(),
                upload_max_attempts: default_upload_max_attempts(),
                upload_base_delay_ms: default_upload_base_delay_ms(),
                upload_max_delay_ms: default_upload_max_delay_ms(),
                submit_max_attempts: default_submit_max_attempts(),
                submit_base_delay_ms: default_submit_base_delay_ms(),
                request_timeout_secs: default_request_timeout_secs(),
                poll_interval_step_ms: default_poll_interval_step_ms(),
                poll_max_interval_ms: default_poll_max_interval_ms(),
                poll_max_attempts: default_poll_max_attempts(),
                poll_timeout_secs: default_poll_timeout_secs(),
                job_timeout_secs: default_job_timeout_secs(),
            },
            storage: StorageConfig {
                endpoint: std::env::var("VOXPIPE_STORAGE_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                bucket: std::env::var("VOXPIPE_STORAGE_BUCKET")
                    .unwrap_or_else(|_| "voice-audio".to_string()),
                fetch_pool_size: default_fetch_pool_size(),
            },
            queue: QueueConfig {
                bootstrap_servers: std::env::var("VOXPIPE_QUEUE_BOOTSTRAP_SERVERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                task_topic: default_task_topic(),
                result_topic: default_result_topic(),
                consumer_group: default_consumer_group(),
            },
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.provider.language_code, "ru");
        assert_eq!(config.provider.upload_max_attempts, 3);
        assert_eq!(config.provider.upload_base_delay_ms, 2000);
        assert_eq!(config.provider.upload_max_delay_ms, 10_000);
        assert_eq!(config.provider.submit_max_attempts, 3);
        assert_eq!(config.provider.submit_base_delay_ms, 1000);
        assert_eq!(config.provider.request_timeout_secs, 30);
        assert_eq!(config.provider.poll_interval_step_ms, 2000);
        assert_eq!(config.provider.poll_max_interval_ms, 10_000);
        assert_eq!(config.provider.poll_max_attempts, 60);
        assert_eq!(config.provider.poll_timeout_secs, 600);
        assert_eq!(config.provider.job_timeout_secs, 600);

        assert_eq!(config.storage.bucket, "voice-audio");
        assert_eq!(config.storage.fetch_pool_size, 4);

        assert_eq!(config.queue.task_topic, "audio.transcription.requests");
        assert_eq!(config.queue.result_topic, "audio.transcription.results");
        assert_eq!(config.queue.consumer_group, "voxpipe");

        assert_eq!(config.worker.concurrency, 3);
        assert!(config.worker.queue_depth > 0);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_duration_accessors() {
        let config = Config::default();

        assert_eq!(config.provider.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.provider.poll_timeout(), Duration::from_secs(600));
        assert_eq!(config.provider.job_timeout(), Duration::from_secs(600));
        assert_eq!(config.provider.upload_base_delay(), Duration::from_millis(2000));
        assert_eq!(config.provider.upload_max_delay(), Duration::from_millis(10_000));
        assert_eq!(config.provider.submit_base_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_provider_config_deserialization_with_defaults() {
        let toml_str = r#"
            base_url = "https://provider.test/v2"
            api_key = "secret"
        "#;

        let provider: ProviderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(provider.base_url, "https://provider.test/v2");
        assert_eq!(provider.api_key, "secret");
        assert_eq!(provider.language_code, "ru");
        assert_eq!(provider.poll_max_attempts, 60);
    }

    #[test]
    fn test_worker_config_defaults() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.concurrency, 3);
        assert_eq!(worker.queue_depth, 64);
    }
}
