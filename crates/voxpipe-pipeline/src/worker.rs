//! Worker pool consuming jobs from the task queue
//!
//! A small fixed pool; each worker holds one job in flight at a time, so
//! total in-flight jobs never exceed the pool size. Acknowledgment is sent
//! only after the terminal result has been handed to the result queue, for
//! both success and classified-failure outcomes; a failed publish leaves the
//! job unacknowledged so the queue redelivers it.

use crate::emitter::ResultEmitter;
use crate::error::PipelineResult;
use crate::orchestrator::JobProcessor;
use crate::queue::{JobDelivery, JobSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use voxpipe_core::config::WorkerConfig;

/// Fixed-size pool of job workers
pub struct WorkerPool {
    config: WorkerConfig,
    source: Arc<dyn JobSource>,
    processor: Arc<JobProcessor>,
    emitter: ResultEmitter,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("concurrency", &self.config.concurrency)
            .field("running", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Assemble a pool from its collaborators
    #[must_use]
    pub fn new(
        config: WorkerConfig,
        source: Arc<dyn JobSource>,
        processor: Arc<JobProcessor>,
        emitter: ResultEmitter,
    ) -> Self {
        Self {
            config,
            source,
            processor,
            emitter,
            workers: Vec::new(),
        }
    }

    /// Spawn the workers
    pub fn start(&mut self) {
        info!(workers = self.config.concurrency, "Starting worker pool");

        for id in 0..self.config.concurrency {
            let source = Arc::clone(&self.source);
            let processor = Arc::clone(&self.processor);
            let emitter = self.emitter.clone();

            self.workers.push(tokio::spawn(async move {
                Self::worker_loop(id, source, processor, emitter).await;
            }));
        }
    }

    async fn worker_loop(
        id: usize,
        source: Arc<dyn JobSource>,
        processor: Arc<JobProcessor>,
        emitter: ResultEmitter,
    ) {
        info!(worker = id, "Worker started");

        while let Some(delivery) = source.recv().await {
            let JobDelivery { job, ack } = delivery;
            info!(
                worker = id,
                task_id = %job.task_id,
                audio_id = %job.audio_id,
                created_at = %job.created_at,
                "Received audio task"
            );

            let result = processor.process(&job).await;

            match emitter.emit(&result).await {
                Ok(()) => {
                    ack.ack();
                    info!(worker = id, task_id = %job.task_id, "Task processed");
                }
                Err(e) => {
                    // No ack: the queue will redeliver this job.
                    error!(
                        worker = id,
                        task_id = %job.task_id,
                        audio_id = %job.audio_id,
                        error = %e,
                        "Result publish failed, job left for redelivery"
                    );
                }
            }
        }

        info!(worker = id, "Worker shutting down");
    }

    /// Wait for every worker to drain and exit
    ///
    /// Workers exit once the job source is closed and empty.
    ///
    /// # Errors
    ///
    /// Never fails; a panicked worker is logged and skipped.
    pub async fn join(mut self) -> PipelineResult<()> {
        for (id, worker) in self.workers.drain(..).enumerate() {
            if let Err(e) = worker.await {
                warn!(worker = id, error = %e, "Worker did not shut down cleanly");
            }
        }

        info!("Worker pool shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobFetcher, MemoryBlobStore};
    use crate::queue::{MemoryJobQueue, MemoryResultSink};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use voxpipe_core::{Job, ResultStatus};
    use voxpipe_provider::{MockProvider, PollConfig, TranscriptStatus};

    fn build_pool(
        provider: MockProvider,
        queue: &MemoryJobQueue,
        sink: &MemoryResultSink,
        concurrency: usize,
    ) -> WorkerPool {
        let store = MemoryBlobStore::new();
        store.insert("audio-1", Bytes::from_static(b"ogg"));
        store.insert("audio-2", Bytes::from_static(b"ogg"));

        let processor = Arc::new(JobProcessor::new(
            BlobFetcher::new(Arc::new(store), 2),
            Arc::new(provider),
            PollConfig::default(),
            Duration::from_secs(600),
        ));

        WorkerPool::new(
            WorkerConfig {
                concurrency,
                queue_depth: 16,
            },
            Arc::new(queue.clone()),
            processor,
            ResultEmitter::new(Arc::new(sink.clone())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_processes_and_acks() {
        let queue = MemoryJobQueue::bounded(8);
        let sink = MemoryResultSink::new();
        let provider =
            MockProvider::new().with_poll_status(TranscriptStatus::completed("hi", None));
        let mut pool = build_pool(provider, &queue, &sink, 1);

        let job = Job::voice("audio-1", 10, "url");
        let task_id = job.task_id.clone();
        queue.enqueue(job).await.unwrap();
        queue.close();

        pool.start();
        pool.join().await.unwrap();

        let published = sink.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "audio-1");
        assert_eq!(published[0].1.status, ResultStatus::Success);
        assert_eq!(queue.acked_tasks(), vec![task_id]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classified_failure_is_published_and_acked() {
        let queue = MemoryJobQueue::bounded(8);
        let sink = MemoryResultSink::new();
        let provider = MockProvider::new().with_upload_failure(3);
        let mut pool = build_pool(provider, &queue, &sink, 1);

        let job = Job::voice("audio-1", 10, "url");
        queue.enqueue(job).await.unwrap();
        queue.close();

        pool.start();
        pool.join().await.unwrap();

        let published = sink.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.status, ResultStatus::Failure);
        assert_eq!(queue.acked_tasks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_withholds_ack() {
        let queue = MemoryJobQueue::bounded(8);
        let sink = MemoryResultSink::new();
        sink.fail_publishes(true);
        let provider =
            MockProvider::new().with_poll_status(TranscriptStatus::completed("hi", None));
        let mut pool = build_pool(provider, &queue, &sink, 1);

        queue.enqueue(Job::voice("audio-1", 10, "url")).await.unwrap();
        queue.close();

        pool.start();
        pool.join().await.unwrap();

        assert!(sink.published().is_empty());
        assert!(queue.acked_tasks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_workers_drain_the_queue() {
        let queue = MemoryJobQueue::bounded(8);
        let sink = MemoryResultSink::new();
        let provider = MockProvider::new()
            .with_poll_status(TranscriptStatus::completed("a", None))
            .with_poll_status(TranscriptStatus::completed("b", None));
        let mut pool = build_pool(provider, &queue, &sink, 3);

        queue.enqueue(Job::voice("audio-1", 1, "url")).await.unwrap();
        queue.enqueue(Job::voice("audio-2", 2, "url")).await.unwrap();
        queue.close();

        pool.start();
        pool.join().await.unwrap();

        assert_eq!(sink.published().len(), 2);
        assert_eq!(queue.acked_tasks().len(), 2);
    }
}
