//! Blob store access with blocking-call isolation
//!
//! Blob store clients are typically blocking primitives. [`BlobFetcher`]
//! routes every fetch through `spawn_blocking` behind a fixed number of
//! permits, so slow storage I/O never stalls the event loop that services
//! the network-bound transcription calls.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

/// Errors from the blob store
#[derive(Error, Debug)]
pub enum BlobError {
    /// No object exists under the requested key
    #[error("Audio object not found: {key}")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// The store failed to read the object
    #[error("Blob store I/O error: {message}")]
    Io {
        /// Underlying failure description
        message: String,
    },
}

impl BlobError {
    /// Create a not-found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

/// Synchronous blob store interface
///
/// Implementations may block; callers go through [`BlobFetcher`], never
/// directly from async context.
pub trait BlobStore: Send + Sync {
    /// Read the raw bytes stored under `audio_id`
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::NotFound`] for a missing key and
    /// [`BlobError::Io`] for read failures.
    fn fetch(&self, audio_id: &str) -> Result<Bytes, BlobError>;
}

/// Async façade over a blocking [`BlobStore`]
///
/// Each fetch takes a permit from a bounded pool and runs on the blocking
/// thread pool; at most `pool_size` fetches are in flight at once.
#[derive(Clone)]
pub struct BlobFetcher {
    store: Arc<dyn BlobStore>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for BlobFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobFetcher")
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl BlobFetcher {
    /// Wrap a store with a bounded fetch pool
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, pool_size: usize) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(pool_size.max(1))),
        }
    }

    /// Fetch the audio bytes for `audio_id` without blocking the event loop
    ///
    /// # Errors
    ///
    /// Propagates the store's [`BlobError`]; a closed pool or a panicking
    /// store surfaces as [`BlobError::Io`].
    pub async fn get(&self, audio_id: &str) -> Result<Bytes, BlobError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BlobError::io("fetch pool closed"))?;

        let store = Arc::clone(&self.store);
        let key = audio_id.to_string();

        let bytes = tokio::task::spawn_blocking(move || store.fetch(&key))
            .await
            .map_err(|e| BlobError::io(format!("fetch task failed: {e}")))??;

        debug!(audio_id, bytes = bytes.len(), "Fetched audio from blob store");
        Ok(bytes)
    }
}

/// In-memory [`BlobStore`] for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under a key, replacing any existing object
    pub fn insert(&self, audio_id: impl Into<String>, bytes: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert(audio_id.into(), bytes.into());
    }
}

impl BlobStore for MemoryBlobStore {
    fn fetch(&self, audio_id: &str) -> Result<Bytes, BlobError> {
        self.objects
            .lock()
            .unwrap()
            .get(audio_id)
            .cloned()
            .ok_or_else(|| BlobError::not_found(audio_id))
    }
}
