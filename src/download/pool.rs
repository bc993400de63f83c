//! Bounded pool for blocking extractor work.
//!
//! Jobs run on tokio's blocking threads; a semaphore caps how many run at
//! once. Jobs submitted while every slot is busy wait in the semaphore's FIFO
//! queue. That queue is unbounded: submitters get no back-pressure signal,
//! they simply wait longer.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::core::config;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool was shut down before the job could start
    #[error("worker pool is shut down")]
    Closed,
    /// The job panicked while running
    #[error("job panicked: {0}")]
    Panicked(String),
}

/// How [`WorkerPool::shutdown`] treats outstanding jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownMode {
    /// Stop accepting jobs, then wait for queued and running jobs to finish
    #[default]
    Drain,
    /// Stop accepting jobs, drop queued ones, and return without waiting
    /// for running ones (blocking calls cannot be interrupted)
    Abandon,
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub queued: usize,
    pub running: usize,
    pub completed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicUsize,
    running: AtomicUsize,
    completed: AtomicU64,
}

/// Fixed number of slots running blocking closures off the async scheduler.
#[derive(Debug)]
pub struct WorkerPool {
    capacity: usize,
    slots: Arc<Semaphore>,
    tasks: TaskTracker,
    counters: Arc<Counters>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(config::pool::DEFAULT_MAX_WORKERS)
    }
}

impl WorkerPool {
    /// Creates a pool with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        log::info!("Worker pool started with {} slots", capacity);
        Self {
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
            tasks: TaskTracker::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.tasks.is_closed()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            queued: self.counters.queued.load(Ordering::SeqCst),
            running: self.counters.running.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
        }
    }

    /// Queues `job` and returns immediately.
    ///
    /// The job runs exactly once, on one blocking thread, to completion. If
    /// the pool is shut down first, the job is dropped without running and
    /// the handle reports [`PoolError::Closed`]. Must be called from within a
    /// tokio runtime.
    pub fn submit<F, T>(&self, job: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.tasks.is_closed() {
            log::warn!("Worker pool is shut down, rejecting job");
            return JobHandle { inner: None };
        }

        let slots = Arc::clone(&self.slots);
        let counters = Arc::clone(&self.counters);
        let waiting = counters.queued.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "Job queued ({} waiting, {}/{} slots busy)",
            waiting,
            counters.running.load(Ordering::SeqCst),
            self.capacity
        );

        let handle = self.tasks.spawn(async move {
            let permit = slots.acquire_owned().await;
            counters.queued.fetch_sub(1, Ordering::SeqCst);
            let _permit = match permit {
                Ok(permit) => permit,
                Err(_) => {
                    log::debug!("Queued job dropped: pool shut down before it started");
                    return Err(PoolError::Closed);
                }
            };

            counters.running.fetch_add(1, Ordering::SeqCst);
            let outcome = tokio::task::spawn_blocking(job).await;
            counters.running.fetch_sub(1, Ordering::SeqCst);
            counters.completed.fetch_add(1, Ordering::SeqCst);

            outcome.map_err(|e| {
                log::error!("Worker job failed: {}", e);
                PoolError::Panicked(e.to_string())
            })
        });

        JobHandle { inner: Some(handle) }
    }

    /// Closes the pool to new jobs and settles outstanding ones per `mode`.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        let stats = self.stats();
        log::info!(
            "Worker pool shutting down ({:?}): {} queued, {} running",
            mode,
            stats.queued,
            stats.running
        );
        self.tasks.close();

        match mode {
            ShutdownMode::Drain => {
                self.tasks.wait().await;
                log::info!("Worker pool drained");
            }
            ShutdownMode::Abandon => {
                self.slots.close();
            }
        }
    }
}

/// Result handle for a submitted job. Dropping it detaches the job.
#[derive(Debug)]
pub struct JobHandle<T> {
    inner: Option<JoinHandle<Result<T, PoolError>>>,
}

impl<T> JobHandle<T> {
    /// Waits for the job's return value.
    pub async fn join(self) -> Result<T, PoolError> {
        let Some(handle) = self.inner else {
            return Err(PoolError::Closed);
        };
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PoolError::Closed),
            Err(e) => Err(PoolError::Panicked(e.to_string())),
        }
    }
}
