//! Queue interfaces the pipeline needs, and in-memory transports
//!
//! Only the consuming and publishing seams are modeled here; broker drivers
//! are external collaborators. Acknowledgment is manual and at-least-once:
//! a delivery dropped without [`AckToken::ack`] stays eligible for
//! redelivery.

use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;
use voxpipe_core::{Job, TranscriptionResult};

/// Manual acknowledgment for one delivered job
pub trait AckToken: Send {
    /// Mark the inbound job as consumed; the queue stops redelivering it
    fn ack(self: Box<Self>);
}

/// One job delivered from the task queue, with its ack handle
pub struct JobDelivery {
    /// The job record
    pub job: Job,

    /// Manual acknowledgment token
    pub ack: Box<dyn AckToken>,
}

impl std::fmt::Debug for JobDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDelivery")
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

/// Source of jobs for the worker pool
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Receive the next delivery; `None` when the source is closed and drained
    async fn recv(&self) -> Option<JobDelivery>;
}

/// Destination for terminal results
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Publish a result under a partition/ordering key
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Publish`] when the result could not be
    /// durably handed to the queue.
    async fn publish(&self, key: &str, result: &TranscriptionResult) -> PipelineResult<()>;
}

/// Bounded in-memory job queue with an acknowledgment ledger
///
/// Clones share the channel and the ledger; tests hand one clone to the
/// worker pool and inspect `acked_tasks` on another.
#[derive(Debug, Clone)]
pub struct MemoryJobQueue {
    sender: async_channel::Sender<Job>,
    receiver: async_channel::Receiver<Job>,
    acked: Arc<Mutex<Vec<String>>>,
}

impl MemoryJobQueue {
    /// Create a queue bounded to `capacity` undelivered jobs
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = async_channel::bounded(capacity);
        Self {
            sender,
            receiver,
            acked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Enqueue a job for delivery
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::QueueClosed`] if the queue was closed.
    pub async fn enqueue(&self, job: Job) -> PipelineResult<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| PipelineError::QueueClosed)
    }

    /// Close the queue; workers drain what is buffered and stop
    pub fn close(&self) {
        self.sender.close();
    }

    /// Task ids acknowledged so far, in ack order
    pub fn acked_tasks(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

struct MemoryAck {
    task_id: String,
    ledger: Arc<Mutex<Vec<String>>>,
}

impl AckToken for MemoryAck {
    fn ack(self: Box<Self>) {
        debug!(task_id = %self.task_id, "Job acknowledged");
        self.ledger.lock().unwrap().push(self.task_id);
    }
}

#[async_trait]
impl JobSource for MemoryJobQueue {
    async fn recv(&self) -> Option<JobDelivery> {
        let job = self.receiver.recv().await.ok()?;
        let ack = Box::new(MemoryAck {
            task_id: job.task_id.clone(),
            ledger: Arc::clone(&self.acked),
        });
        Some(JobDelivery { job, ack })
    }
}

/// In-memory [`ResultSink`] recording every published result
#[derive(Debug, Clone, Default)]
pub struct MemoryResultSink {
    records: Arc<Mutex<Vec<(String, TranscriptionResult)>>>,
    fail_publishes: Arc<Mutex<bool>>,
}

impl MemoryResultSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail
    pub fn fail_publishes(&self, fail: bool) {
        *self.fail_publishes.lock().unwrap() = fail;
    }

    /// All published `(key, result)` pairs, in publish order
    pub fn published(&self) -> Vec<(String, TranscriptionResult)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for MemoryResultSink {
    async fn publish(&self, key: &str, result: &TranscriptionResult) -> PipelineResult<()> {
        if *self.fail_publishes.lock().unwrap() {
            return Err(PipelineError::publish("simulated broker failure"));
        }
        self.records
            .lock()
            .unwrap()
            .push((key.to_string(), result.clone()));
        Ok(())
    }
}
