// Compute pool for CPU-bound work (embedding, reranking).
// A fixed set of worker threads drains one FIFO job queue, so heavy scoring
// never occupies the async executor that drives the retrieval fan-out.

use crate::{Result, SearchError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    jobs: Mutex<VecDeque<Job>>,
    condvar: Condvar,
    running: AtomicBool,
}

/// Fixed-size worker pool
pub struct ComputePool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ComputePool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SearchError::InvalidConfig(
                "compute pool needs at least one worker".to_string(),
            ));
        }

        let shared = Arc::new(Shared {
            jobs: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let shared = shared.clone();
            let handle = thread::Builder::new()
                .name(format!("compute-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, &shared))
                .map_err(|e| SearchError::ComputePool(format!("failed to spawn worker: {e}")))?;
            workers.push(handle);
        }
        debug!(size, "compute pool started");

        Ok(Self { shared, workers })
    }

    /// Queue a job; the receiver yields its return value
    pub fn submit<F, T>(&self, job: F) -> Result<oneshot::Receiver<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            // The caller may have given up waiting
            let _ = tx.send(job());
        });

        {
            // `running` is only flipped under this lock, so an accepted job
            // is always seen by a worker before it exits
            let mut jobs = self.shared.jobs.lock();
            if !self.shared.running.load(Ordering::Acquire) {
                return Err(SearchError::ComputePool("pool is shut down".to_string()));
            }
            jobs.push_back(job);
        }
        self.shared.condvar.notify_one();
        Ok(rx)
    }

    /// Run a job on the pool and wait for its result without blocking the
    /// calling task's executor thread
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(job)?
            .await
            .map_err(|_| SearchError::ComputePool("job was dropped before completing".to_string()))
    }

    /// Stop accepting jobs. Workers finish what is already queued.
    pub fn shutdown(&self) {
        {
            let _jobs = self.shared.jobs.lock();
            self.shared.running.store(false, Ordering::Release);
        }
        self.shared.condvar.notify_all();
    }
}

impl Drop for ComputePool {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(worker_id: usize, shared: &Shared) {
    loop {
        let job = {
            let mut jobs = shared.jobs.lock();
            while jobs.is_empty() && shared.running.load(Ordering::Acquire) {
                shared.condvar.wait(&mut jobs);
            }
            match jobs.pop_front() {
                Some(job) => job,
                None => break,
            }
        };

        // A panicking job drops its sender; the waiter sees a ComputePool error
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(worker_id, "compute job panicked");
        }
    }
    debug!(worker_id, "compute worker stopped");
}
