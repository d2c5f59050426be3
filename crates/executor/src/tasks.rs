//! Async execute task registry.
//!
//! `submit` hands a scan-and-apply job to the store, records it as
//! RUNNING under a fresh task id, and returns. One poller thread checks
//! every RUNNING task's job each `poll_interval_ms` and moves the task to
//! COMPLETE or ERROR. A slow job never delays another task's transition,
//! however many are running. Terminal states are never left.
//!
//! ## Retention
//!
//! | State | Evicted |
//! |-------|---------|
//! | RUNNING | never |
//! | COMPLETE / ERROR | `retention_secs` after finishing |
//!
//! Eviction is lazy: expired entries are swept on `submit` and dropped when
//! `status` finds them. A submission reserves one of `max_tracked_tasks`
//! slots before the job reaches the store and is refused when none is free.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use recordgate_core::Operation;
use recordgate_store::{BackgroundRequest, JobId, JobState, StoreClient, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TaskRegistryConfig;
use crate::scan::ScanSpec;

/// Unique id of an execute task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Fresh random id.
    pub fn new() -> Self {
        TaskId(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TaskId)
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// The store is still running the job
    Running,
    /// The job finished successfully
    Complete,
    /// The job failed
    Error,
}

impl TaskStatus {
    /// Whether the state is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "RUNNING",
            TaskStatus::Complete => "COMPLETE",
            TaskStatus::Error => "ERROR",
        }
    }
}

/// A tracked execute task.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteTask {
    /// Task id
    pub id: TaskId,
    /// Store job being watched
    pub job: JobId,
    /// Namespace the job scans
    pub namespace: String,
    /// Set the job scans
    pub set: Option<String>,
    /// Current state
    pub status: TaskStatus,
    /// When the task was accepted
    pub submitted_at: DateTime<Utc>,
    /// When the task reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
    /// Records modified, once complete
    pub records: Option<u64>,
    /// Failure reason, when status is ERROR
    pub error: Option<String>,
}

impl ExecuteTask {
    fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        match self.finished_at {
            Some(finished) if self.status.is_terminal() => finished
                .checked_add_signed(retention)
                .map_or(false, |expires| expires <= now),
            _ => false,
        }
    }
}

/// Task registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The id was never issued, or its task has been evicted
    #[error("task not found: {task_id}")]
    NotFound {
        /// Requested id
        task_id: String,
    },

    /// The operation list cannot run as a background job
    #[error("invalid operations: {reason}")]
    InvalidOperations {
        /// Details
        reason: String,
    },

    /// Every task slot is taken
    #[error("task registry overloaded: {reason}")]
    Overloaded {
        /// Details
        reason: String,
    },

    /// The store refused the job
    #[error("job rejected: {0}")]
    Rejected(StoreError),
}

/// Registry of execute tasks. Share it behind an `Arc`.
pub struct TaskRegistry {
    store: Arc<dyn StoreClient>,
    tasks: Arc<DashMap<TaskId, ExecuteTask>>,
    /// Reserved slots, including submissions still waiting on the store
    tracked: AtomicUsize,
    config: TaskRegistryConfig,
    signal: Arc<PollerSignal>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl TaskRegistry {
    /// Create a registry and start its poller thread.
    pub fn new(store: Arc<dyn StoreClient>, config: TaskRegistryConfig) -> std::io::Result<Self> {
        let tasks = Arc::new(DashMap::new());
        let signal = Arc::new(PollerSignal::default());
        let poller = Poller {
            store: Arc::clone(&store),
            tasks: Arc::clone(&tasks),
            signal: Arc::clone(&signal),
            interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        };
        let handle = std::thread::Builder::new()
            .name("recordgate-task-poller".to_string())
            .spawn(move || poller.run())?;

        Ok(TaskRegistry {
            store,
            tasks,
            tracked: AtomicUsize::new(0),
            config,
            signal,
            poller: Mutex::new(Some(handle)),
        })
    }

    /// Settings in effect.
    pub fn config(&self) -> &TaskRegistryConfig {
        &self.config
    }

    fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.retention_secs.min(i64::MAX as u64 / 1000) as i64)
    }

    fn reserve_slot(&self) -> Result<(), TaskError> {
        let max = self.config.max_tracked_tasks;
        self.tracked
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|n| TaskError::Overloaded {
                reason: format!("{} tasks tracked", n),
            })
    }

    fn release_slots(&self, n: usize) {
        if n > 0 {
            self.tracked.fetch_sub(n, Ordering::AcqRel);
        }
    }

    /// Submit a scan-and-apply job. Returns once the store has accepted it.
    pub fn submit(&self, spec: &ScanSpec, ops: Vec<Operation>) -> Result<ExecuteTask, TaskError> {
        if ops.is_empty() {
            return Err(TaskError::InvalidOperations {
                reason: "opsList must not be empty".to_string(),
            });
        }
        if let Some(op) = ops.iter().find(|op| op.is_read()) {
            return Err(TaskError::InvalidOperations {
                reason: format!("read operation {:?} is not allowed in a background job", op),
            });
        }

        self.sweep();
        self.reserve_slot()?;

        let job = match self.store.execute_background(BackgroundRequest {
            namespace: spec.namespace.clone(),
            set: spec.set.clone(),
            filter: spec.filter.clone(),
            ops,
        }) {
            Ok(job) => job,
            Err(e) => {
                self.release_slots(1);
                return Err(TaskError::Rejected(e));
            }
        };

        let task = ExecuteTask {
            id: TaskId::new(),
            job,
            namespace: spec.namespace.clone(),
            set: spec.set.clone(),
            status: TaskStatus::Running,
            submitted_at: Utc::now(),
            finished_at: None,
            records: None,
            error: None,
        };
        // Visible before submit returns.
        self.tasks.insert(task.id, task.clone());

        info!(target: "recordgate::tasks", task = %task.id, job = job.0, namespace = %task.namespace, "Task submitted");
        Ok(task)
    }

    /// Current state of a task. Safe to call repeatedly.
    pub fn status(&self, task_id: &str) -> Result<ExecuteTask, TaskError> {
        let not_found = || TaskError::NotFound {
            task_id: task_id.to_string(),
        };
        let id: TaskId = task_id.parse().map_err(|_| not_found())?;

        let task = self.tasks.get(&id).map(|t| t.clone()).ok_or_else(not_found)?;
        let now = Utc::now();
        let retention = self.retention();
        if task.is_expired(now, retention) {
            if self
                .tasks
                .remove_if(&id, |_, t| t.is_expired(now, retention))
                .is_some()
            {
                self.release_slots(1);
            }
            return Err(not_found());
        }
        Ok(task)
    }

    /// Drop finished tasks past their retention. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let retention = self.retention();
        let mut evicted = 0;
        self.tasks.retain(|_, t| {
            let keep = !t.is_expired(now, retention);
            if !keep {
                evicted += 1;
            }
            keep
        });
        self.release_slots(evicted);
        if evicted > 0 {
            debug!(target: "recordgate::tasks", evicted, "Evicted finished tasks");
        }
        evicted
    }

    /// Number of tracked tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are tracked.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop polling and join the poller. Tasks still running stay RUNNING.
    pub fn shutdown(&self) {
        *self.signal.closing.lock() = true;
        self.signal.wake.notify_all();
        if let Some(handle) = self.poller.lock().take() {
            if handle.join().is_err() {
                warn!(target: "recordgate::tasks", "Task poller panicked");
            }
        }
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Default)]
struct PollerSignal {
    closing: Mutex<bool>,
    wake: Condvar,
}

/// Moves RUNNING tasks to a terminal state once their job finishes.
struct Poller {
    store: Arc<dyn StoreClient>,
    tasks: Arc<DashMap<TaskId, ExecuteTask>>,
    signal: Arc<PollerSignal>,
    interval: Duration,
}

impl Poller {
    fn run(self) {
        loop {
            {
                let mut closing = self.signal.closing.lock();
                if !*closing {
                    self.signal.wake.wait_for(&mut closing, self.interval);
                }
                if *closing {
                    return;
                }
            }
            self.poll_running();
        }
    }

    fn poll_running(&self) {
        // Snapshot first; no map shard stays locked across a store call.
        let running: Vec<(TaskId, JobId)> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .map(|t| (t.id, t.job))
            .collect();

        for (id, job) in running {
            match self.store.job_status(job) {
                Ok(JobState::InProgress) => {}
                Ok(JobState::Done { records }) => {
                    self.finish(id, TaskStatus::Complete, Some(records), None)
                }
                Ok(JobState::Failed { reason }) => {
                    self.finish(id, TaskStatus::Error, None, Some(reason))
                }
                Err(StoreError::JobNotFound { .. }) => self.finish(
                    id,
                    TaskStatus::Error,
                    None,
                    Some("job is no longer known to the store".to_string()),
                ),
                // Transient: the job's outcome is still unknown.
                Err(e) => {
                    warn!(target: "recordgate::tasks", task = %id, error = %e, "Job status poll failed");
                }
            }
        }
    }

    fn finish(&self, id: TaskId, status: TaskStatus, records: Option<u64>, error: Option<String>) {
        let Some(mut task) = self.tasks.get_mut(&id) else {
            return;
        };
        if task.status.is_terminal() {
            return;
        }
        task.status = status;
        task.finished_at = Some(Utc::now());
        task.records = records;
        task.error = error;
        info!(target: "recordgate::tasks", task = %id, status = status.as_str(), "Task finished");
    }
}
