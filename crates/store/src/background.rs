//! Bounded pool for background jobs.
//!
//! A fixed number of named worker threads take jobs from a bounded FIFO
//! queue. Workers are started on the first submission, so building a store
//! never spawns threads. A full queue rejects the job.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::error;

/// Why a job could not be queued.
#[derive(Debug)]
pub(crate) enum SubmitError {
    /// The queue is at capacity
    QueueFull,
    /// The pool was closed
    Closed,
    /// No worker thread could be started
    Spawn(std::io::Error),
}

/// Pool counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolStats {
    /// Jobs waiting for a worker
    pub queued: usize,
    /// Jobs running now
    pub active: usize,
    /// Jobs finished, including panicked ones
    pub completed: u64,
    /// Worker threads started
    pub workers: usize,
}

type Work = Box<dyn FnOnce() + Send>;

struct PoolInner {
    queue: Mutex<VecDeque<Work>>,
    work_ready: Condvar,
    closed: AtomicBool,
    active: AtomicUsize,
    completed: AtomicU64,
    max_queued: usize,
}

pub(crate) struct JobPool {
    inner: Arc<PoolInner>,
    started: Mutex<usize>,
    num_threads: usize,
}

impl JobPool {
    pub(crate) fn new(num_threads: usize, max_queued: usize) -> Self {
        JobPool {
            inner: Arc::new(PoolInner {
                queue: Mutex::new(VecDeque::new()),
                work_ready: Condvar::new(),
                closed: AtomicBool::new(false),
                active: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                max_queued,
            }),
            started: Mutex::new(0),
            num_threads: num_threads.max(1),
        }
    }

    fn ensure_workers(&self) -> Result<(), SubmitError> {
        let mut started = self.started.lock();
        while *started < self.num_threads {
            let inner = Arc::clone(&self.inner);
            let spawned = std::thread::Builder::new()
                .name(format!("memstore-job-{}", *started))
                .spawn(move || worker_loop(&inner));
            match spawned {
                // Workers detach and exit once the pool is closed and idle.
                Ok(_) => *started += 1,
                Err(e) if *started == 0 => return Err(SubmitError::Spawn(e)),
                Err(e) => {
                    error!(target: "recordgate::store", error = %e, workers = *started, "Running with fewer job workers");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Queue a job behind those already waiting.
    pub(crate) fn submit(&self, work: impl FnOnce() + Send + 'static) -> Result<(), SubmitError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(SubmitError::Closed);
        }
        self.ensure_workers()?;
        {
            let mut queue = self.inner.queue.lock();
            if queue.len() >= self.inner.max_queued {
                return Err(SubmitError::QueueFull);
            }
            queue.push_back(Box::new(work));
        }
        self.inner.work_ready.notify_one();
        Ok(())
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            queued: self.inner.queue.lock().len(),
            active: self.inner.active.load(Ordering::Acquire),
            completed: self.inner.completed.load(Ordering::Relaxed),
            workers: *self.started.lock(),
        }
    }

    /// Refuse new jobs. Queued jobs still run.
    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        // Notify under the queue lock so no worker misses the wakeup.
        let _queue = self.inner.queue.lock();
        self.inner.work_ready.notify_all();
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        self.close();
    }
}

struct ActiveGuard<'a> {
    inner: &'a PoolInner,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::AcqRel);
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
    }
}

fn worker_loop(inner: &PoolInner) {
    loop {
        let work = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(work) = queue.pop_front() {
                    inner.active.fetch_add(1, Ordering::AcqRel);
                    break work;
                }
                if inner.closed.load(Ordering::Acquire) {
                    return;
                }
                inner.work_ready.wait(&mut queue);
            }
        };

        let _guard = ActiveGuard { inner };
        if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(work)) {
            error!(
                target: "recordgate::store",
                "background job panicked: {:?}",
                e.downcast_ref::<&str>().copied().unwrap_or("(non-string panic)")
            );
        }
    }
}
