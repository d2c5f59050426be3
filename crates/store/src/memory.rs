//! In-process store.
//!
//! `MemoryStore` implements [`StoreClient`] over named namespaces held in
//! memory. Each namespace keeps its records in a `BTreeMap` ordered by
//! digest, which is also the scan order.
//!
//! ## Resume tokens
//!
//! A resume token is the Base64url form of a version byte followed by the
//! digest of the last record returned. Scans resume strictly after that
//! digest, so records written behind the cursor are not revisited.
//!
//! ## Background jobs
//!
//! Accepted jobs run on a bounded pool of `job_workers` threads behind a
//! queue of at most `max_queued_jobs`; a full queue rejects the job as
//! unavailable. A job updates its records in batches of `job_batch_size`,
//! taking the namespace write lock once per batch, so request traffic on
//! the namespace interleaves with a long job. Records written after a job
//! starts are not part of it.
//!
//! Outcomes of finished jobs are kept for `job_retention_secs` and swept
//! when the next job is accepted.
//!
//! `pause_jobs` holds every job before its first batch and between
//! batches, which lets tests observe the running state.
//!
//! ## Faults
//!
//! `inject_fault` makes every data call fail until `clear_fault`.
//! `Fault::Timeout { in_doubt: true }` applies writes and then reports the
//! timeout, the way a lost acknowledgement does.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Condvar, Mutex, RwLock};
use recordgate_core::{Address, Bins, Digest, Operation, Record, UserKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::background::{JobPool, SubmitError};
use crate::client::{
    BackgroundRequest, InfoResponse, JobId, JobState, ReadOptions, RecordExistsAction, ScanPage,
    ScanRequest, StoreClient, WriteOptions,
};
use crate::digest::compute_digest;
use crate::error::{StoreError, StoreResult};
use crate::expression::Expression;
use crate::ops::apply_operations;

const RESUME_TOKEN_VERSION: u8 = 1;

/// Namespaces, nodes and job limits of a memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    /// Namespace names
    pub namespaces: Vec<String>,
    /// Node names
    pub nodes: Vec<String>,
    /// Threads running background jobs
    pub job_workers: usize,
    /// Accepted jobs that may wait for a thread
    pub max_queued_jobs: usize,
    /// Seconds a finished job's outcome stays queryable
    pub job_retention_secs: u64,
    /// Records a job updates per namespace lock acquisition
    pub job_batch_size: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        MemoryStoreConfig {
            namespaces: vec!["test".to_string()],
            nodes: vec!["node-1".to_string()],
            job_workers: 2,
            max_queued_jobs: 256,
            job_retention_secs: 600,
            job_batch_size: 128,
        }
    }
}

/// Failure injected into every data call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Calls fail as if the cluster were unreachable
    Unavailable,
    /// Calls time out. With `in_doubt`, writes are applied before the
    /// timeout is reported.
    Timeout {
        /// Whether writes land before the timeout
        in_doubt: bool,
    },
}

#[derive(Debug, Clone)]
struct StoredRecord {
    set: Option<String>,
    user_key: Option<UserKey>,
    bins: Bins,
    generation: u32,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<u32> {
        self.expires_at
            .map(|at| (at - now).num_seconds().clamp(1, u32::MAX as i64) as u32)
    }

    fn to_record(&self, namespace: &str, digest: Digest, bins: Bins, now: DateTime<Utc>) -> Record {
        let user_key = self.user_key.clone().unwrap_or(UserKey::Digest(digest));
        Record {
            address: Address::new(namespace, self.set.as_deref(), user_key),
            digest,
            bins,
            generation: self.generation,
            expiration: self.remaining_ttl(now),
        }
    }
}

type Namespace = BTreeMap<Digest, StoredRecord>;

#[derive(Debug, Clone)]
struct JobEntry {
    state: JobState,
    finished_at: Option<DateTime<Utc>>,
}

struct Inner {
    namespaces: HashMap<String, RwLock<Namespace>>,
    nodes: Vec<String>,
    down_nodes: Mutex<HashSet<String>>,
    fault: Mutex<Option<Fault>>,
    jobs: Mutex<HashMap<u64, JobEntry>>,
    next_job: AtomicU64,
    jobs_paused: Mutex<bool>,
    jobs_resumed: Condvar,
    pool: JobPool,
    job_retention: Duration,
    job_batch_size: usize,
}

impl Inner {
    fn wait_while_paused(&self) {
        let mut paused = self.jobs_paused.lock();
        while *paused {
            self.jobs_resumed.wait(&mut paused);
        }
    }

    fn record_job(&self, id: u64, state: JobState) {
        let finished_at = state.is_terminal().then(Utc::now);
        self.jobs.lock().insert(id, JobEntry { state, finished_at });
    }

    /// Forget finished jobs older than the retention window.
    fn sweep_jobs(&self, now: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.lock();
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at {
            Some(at) => at
                .checked_add_signed(self.job_retention)
                .map_or(true, |expires| expires > now),
            None => true,
        });
        before - jobs.len()
    }
}

/// In-process store. Clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("namespaces", &self.inner.namespaces.keys().collect::<Vec<_>>())
            .field("nodes", &self.inner.nodes)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryStoreConfig::default())
    }
}

impl MemoryStore {
    /// Create a store with the configured namespaces and nodes.
    pub fn new(config: MemoryStoreConfig) -> Self {
        let namespaces = config
            .namespaces
            .into_iter()
            .map(|ns| (ns, RwLock::new(Namespace::new())))
            .collect();
        MemoryStore {
            inner: Arc::new(Inner {
                namespaces,
                nodes: config.nodes,
                down_nodes: Mutex::new(HashSet::new()),
                fault: Mutex::new(None),
                jobs: Mutex::new(HashMap::new()),
                next_job: AtomicU64::new(1),
                jobs_paused: Mutex::new(false),
                jobs_resumed: Condvar::new(),
                pool: JobPool::new(config.job_workers, config.max_queued_jobs),
                job_retention: Duration::seconds(
                    config.job_retention_secs.min(i64::MAX as u64 / 1000) as i64,
                ),
                job_batch_size: config.job_batch_size.max(1),
            }),
        }
    }

    // ========================================================================
    // Test hooks
    // ========================================================================

    /// Fail every data call with `fault` until cleared.
    pub fn inject_fault(&self, fault: Fault) {
        *self.inner.fault.lock() = Some(fault);
    }

    /// Remove an injected fault.
    pub fn clear_fault(&self) {
        *self.inner.fault.lock() = None;
    }

    /// Mark a node reachable or unreachable. With every node down, data
    /// calls fail as unavailable.
    pub fn set_node_available(&self, node: &str, available: bool) {
        let mut down = self.inner.down_nodes.lock();
        if available {
            down.remove(node);
        } else {
            down.insert(node.to_string());
        }
    }

    /// Hold background jobs before their next batch of records.
    pub fn pause_jobs(&self) {
        *self.inner.jobs_paused.lock() = true;
    }

    /// Release held background jobs.
    pub fn resume_jobs(&self) {
        *self.inner.jobs_paused.lock() = false;
        self.inner.jobs_resumed.notify_all();
    }

    /// Number of live records in a namespace.
    pub fn record_count(&self, namespace: &str) -> usize {
        let now = Utc::now();
        self.inner
            .namespaces
            .get(namespace)
            .map(|ns| ns.read().values().filter(|r| !r.is_expired(now)).count())
            .unwrap_or(0)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn namespace(&self, name: &str) -> StoreResult<&RwLock<Namespace>> {
        self.inner
            .namespaces
            .get(name)
            .ok_or_else(|| StoreError::NamespaceNotFound {
                namespace: name.to_string(),
            })
    }

    /// Returns whether a write must report an in-doubt timeout after
    /// applying.
    fn admit(&self) -> StoreResult<bool> {
        {
            let down = self.inner.down_nodes.lock();
            if !self.inner.nodes.is_empty() && self.inner.nodes.iter().all(|n| down.contains(n)) {
                return Err(StoreError::Unavailable {
                    reason: "no cluster node reachable".to_string(),
                });
            }
        }
        match *self.inner.fault.lock() {
            None => Ok(false),
            Some(Fault::Unavailable) => Err(StoreError::Unavailable {
                reason: "cluster unreachable".to_string(),
            }),
            Some(Fault::Timeout { in_doubt: false }) => Err(StoreError::Timeout { in_doubt: false }),
            Some(Fault::Timeout { in_doubt: true }) => Ok(true),
        }
    }

    fn admit_read(&self) -> StoreResult<()> {
        if self.admit()? {
            return Err(StoreError::Timeout { in_doubt: false });
        }
        Ok(())
    }

    fn finish_write<T>(in_doubt: bool, result: StoreResult<T>) -> StoreResult<T> {
        match result {
            Ok(_) if in_doubt => Err(StoreError::Timeout { in_doubt: true }),
            other => other,
        }
    }

    fn live<'a>(ns: &'a Namespace, digest: &Digest, now: DateTime<Utc>) -> Option<&'a StoredRecord> {
        ns.get(digest).filter(|r| !r.is_expired(now))
    }

    fn check_generation(expected: Option<u32>, actual: u32) -> StoreResult<()> {
        match expected {
            Some(expected) if expected != actual => {
                Err(StoreError::GenerationMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn check_exists_action(action: RecordExistsAction, exists: bool) -> StoreResult<()> {
        match action {
            RecordExistsAction::CreateOnly if exists => Err(StoreError::RecordExists),
            RecordExistsAction::UpdateOnly | RecordExistsAction::ReplaceOnly if !exists => {
                Err(StoreError::RecordNotFound)
            }
            _ => Ok(()),
        }
    }

    fn expiry(
        requested: Option<u32>,
        current: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match requested {
            None => current,
            Some(0) => None,
            Some(secs) => Some(now + Duration::seconds(secs as i64)),
        }
    }

    fn project(bins: &Bins, projection: Option<&[String]>) -> Bins {
        match projection {
            None => bins.clone(),
            Some(names) => names
                .iter()
                .filter_map(|n| bins.get(n).map(|v| (n.clone(), v.clone())))
                .collect(),
        }
    }

    fn encode_resume(digest: &Digest) -> String {
        let mut raw = Vec::with_capacity(1 + digest.as_bytes().len());
        raw.push(RESUME_TOKEN_VERSION);
        raw.extend_from_slice(digest.as_bytes());
        URL_SAFE_NO_PAD.encode(raw)
    }

    fn decode_resume(token: &str) -> StoreResult<Digest> {
        let invalid = |reason: &str| StoreError::InvalidResumeToken {
            reason: reason.to_string(),
        };
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim_end_matches('='))
            .map_err(|_| invalid("not base64url"))?;
        match raw.split_first() {
            Some((&RESUME_TOKEN_VERSION, rest)) => {
                Digest::from_slice(rest).ok_or_else(|| invalid("wrong digest length"))
            }
            Some(_) => Err(invalid("unknown token version")),
            None => Err(invalid("empty token")),
        }
    }

    fn run_job(inner: &Inner, id: u64, request: &BackgroundRequest) -> JobState {
        inner.wait_while_paused();

        let Some(lock) = inner.namespaces.get(&request.namespace) else {
            return JobState::Failed {
                reason: format!("namespace not found: {}", request.namespace),
            };
        };

        let now = Utc::now();
        let candidates: Vec<Digest> = lock
            .read()
            .iter()
            .filter(|(_, r)| !r.is_expired(now))
            .filter(|(_, r)| request.set.is_none() || r.set == request.set)
            .map(|(digest, _)| *digest)
            .collect();

        let mut modified = 0u64;
        for (i, batch) in candidates.chunks(inner.job_batch_size).enumerate() {
            if i > 0 {
                inner.wait_while_paused();
            }
            let now = Utc::now();
            let mut ns = lock.write();
            for digest in batch {
                let Some(record) = ns.get_mut(digest) else {
                    continue;
                };
                if record.is_expired(now) {
                    continue;
                }
                if let Some(filter) = &request.filter {
                    if !filter.matches(&record.bins, record.generation) {
                        continue;
                    }
                }
                let mut bins = record.bins.clone();
                if let Err(e) = apply_operations(&mut bins, &request.ops) {
                    warn!(target: "recordgate::store", job = id, error = %e, "Background job failed");
                    return JobState::Failed {
                        reason: e.to_string(),
                    };
                }
                // Records left without bins no longer exist.
                let emptied = bins.is_empty();
                record.bins = bins;
                record.generation = record.generation.wrapping_add(1);
                modified += 1;
                if emptied {
                    ns.remove(digest);
                }
            }
        }

        debug!(target: "recordgate::store", job = id, records = modified, "Background job done");
        JobState::Done { records: modified }
    }

    fn info_command(&self, node: &str, command: &str) -> String {
        let now = Utc::now();
        match command {
            "build" => env!("CARGO_PKG_VERSION").to_string(),
            "node" => node.to_string(),
            "status" => "ok".to_string(),
            "namespaces" => {
                let mut names: Vec<&str> =
                    self.inner.namespaces.keys().map(String::as_str).collect();
                names.sort_unstable();
                names.join(";")
            }
            "statistics" => {
                let objects: usize = self
                    .inner
                    .namespaces
                    .values()
                    .map(|ns| ns.read().values().filter(|r| !r.is_expired(now)).count())
                    .sum();
                let jobs = self.inner.jobs.lock().len();
                let pool = self.inner.pool.stats();
                format!(
                    "objects={};jobs={};jobs_active={};jobs_queued={};jobs_completed={};job_workers={}",
                    objects, jobs, pool.active, pool.queued, pool.completed, pool.workers
                )
            }
            other => match other.strip_prefix("namespace/") {
                Some(ns) if self.inner.namespaces.contains_key(ns) => {
                    format!("objects={}", self.record_count(ns))
                }
                Some(_) => "type=unknown".to_string(),
                None => String::new(),
            },
        }
    }
}

impl StoreClient for MemoryStore {
    fn get(&self, address: &Address, options: &ReadOptions) -> StoreResult<Record> {
        self.admit_read()?;
        let ns = self.namespace(&address.namespace)?.read();
        let digest = compute_digest(address.set.as_deref(), &address.user_key);
        let now = Utc::now();
        let stored = Self::live(&ns, &digest, now).ok_or(StoreError::RecordNotFound)?;

        if let Some(filter) = &options.filter {
            if !filter.matches(&stored.bins, stored.generation) {
                return Err(StoreError::FilteredOut);
            }
        }

        let bins = Self::project(&stored.bins, options.bins.as_deref());
        let mut record = stored.to_record(&address.namespace, digest, bins, now);
        record.address = address.clone();
        Ok(record)
    }

    fn exists(&self, address: &Address, filter: Option<&Expression>) -> StoreResult<bool> {
        self.admit_read()?;
        let ns = self.namespace(&address.namespace)?.read();
        let digest = compute_digest(address.set.as_deref(), &address.user_key);
        Ok(Self::live(&ns, &digest, Utc::now())
            .map(|r| filter.map(|f| f.matches(&r.bins, r.generation)).unwrap_or(true))
            .unwrap_or(false))
    }

    fn put(&self, address: &Address, bins: &Bins, options: &WriteOptions) -> StoreResult<()> {
        let in_doubt = self.admit()?;
        let mut ns = self.namespace(&address.namespace)?.write();
        let digest = compute_digest(address.set.as_deref(), &address.user_key);
        let now = Utc::now();

        let result = (|| -> StoreResult<()> {
            let existing = Self::live(&ns, &digest, now).cloned();
            Self::check_exists_action(options.exists, existing.is_some())?;
            if let Some(current) = &existing {
                Self::check_generation(options.generation, current.generation)?;
            } else if let Some(expected) = options.generation {
                return Err(StoreError::GenerationMismatch {
                    expected,
                    actual: 0,
                });
            }

            let replace = matches!(
                options.exists,
                RecordExistsAction::Replace
                    | RecordExistsAction::ReplaceOnly
                    | RecordExistsAction::CreateOnly
            );
            let mut next = match (&existing, replace) {
                (Some(current), false) => current.bins.clone(),
                _ => Bins::new(),
            };
            for (name, value) in bins {
                if value.is_null() {
                    next.remove(name);
                } else {
                    next.insert(name.clone(), value.clone());
                }
            }

            if next.is_empty() {
                ns.remove(&digest);
                return Ok(());
            }

            let generation = existing.as_ref().map(|r| r.generation).unwrap_or(0);
            let current_expiry = existing.as_ref().and_then(|r| r.expires_at);
            ns.insert(
                digest,
                StoredRecord {
                    set: address.set.clone(),
                    user_key: stored_user_key(&address.user_key),
                    bins: next,
                    generation: generation.wrapping_add(1),
                    expires_at: Self::expiry(options.expiration, current_expiry, now),
                },
            );
            Ok(())
        })();

        Self::finish_write(in_doubt, result)
    }

    fn delete(&self, address: &Address, options: &WriteOptions) -> StoreResult<bool> {
        let in_doubt = self.admit()?;
        let mut ns = self.namespace(&address.namespace)?.write();
        let digest = compute_digest(address.set.as_deref(), &address.user_key);
        let now = Utc::now();

        let result = match Self::live(&ns, &digest, now).map(|r| r.generation) {
            None => {
                ns.remove(&digest);
                Ok(false)
            }
            Some(generation) => Self::check_generation(options.generation, generation).map(|_| {
                ns.remove(&digest);
                true
            }),
        };

        Self::finish_write(in_doubt, result)
    }

    fn operate(
        &self,
        address: &Address,
        ops: &[Operation],
        options: &WriteOptions,
    ) -> StoreResult<Record> {
        if ops.is_empty() {
            return Err(StoreError::parameter("operation list is empty"));
        }
        let in_doubt = self.admit()?;
        let mut ns = self.namespace(&address.namespace)?.write();
        let digest = compute_digest(address.set.as_deref(), &address.user_key);
        let now = Utc::now();

        let result = (|| -> StoreResult<Record> {
            let existing = Self::live(&ns, &digest, now).cloned();
            let writes = ops.iter().any(|op| !op.is_read());
            let touches = ops.iter().any(|op| matches!(op, Operation::Touch));
            if existing.is_none() && (!writes || touches) {
                return Err(StoreError::RecordNotFound);
            }
            Self::check_exists_action(options.exists, existing.is_some())?;
            if let Some(current) = &existing {
                Self::check_generation(options.generation, current.generation)?;
            }

            let mut bins = existing.as_ref().map(|r| r.bins.clone()).unwrap_or_default();
            let applied = apply_operations(&mut bins, ops)?;

            let mut stored = existing.unwrap_or(StoredRecord {
                set: address.set.clone(),
                user_key: stored_user_key(&address.user_key),
                bins: Bins::new(),
                generation: 0,
                expires_at: None,
            });
            if applied.modified {
                stored.bins = bins;
                stored.generation = stored.generation.wrapping_add(1);
                stored.expires_at = Self::expiry(options.expiration, stored.expires_at, now);
                if stored.bins.is_empty() {
                    ns.remove(&digest);
                } else {
                    ns.insert(digest, stored.clone());
                }
            }

            let mut record = stored.to_record(&address.namespace, digest, applied.results, now);
            record.address = address.clone();
            Ok(record)
        })();

        Self::finish_write(in_doubt, result)
    }

    fn scan_page(&self, request: &ScanRequest) -> StoreResult<ScanPage> {
        self.admit_read()?;
        if request.max_records == 0 {
            return Err(StoreError::parameter("max_records must be positive"));
        }
        let ns = self.namespace(&request.namespace)?.read();
        let lower = match &request.resume {
            Some(token) => Bound::Excluded(Self::decode_resume(token)?),
            None => Bound::Unbounded,
        };
        let now = Utc::now();

        let mut matching = ns
            .range((lower, Bound::Unbounded))
            .filter(|(_, r)| !r.is_expired(now))
            .filter(|(_, r)| request.set.is_none() || r.set == request.set)
            .filter(|(_, r)| {
                request
                    .filter
                    .as_ref()
                    .map(|f| f.matches(&r.bins, r.generation))
                    .unwrap_or(true)
            });

        let mut records = Vec::with_capacity(request.max_records);
        for (digest, stored) in matching.by_ref().take(request.max_records) {
            let bins = Self::project(&stored.bins, request.bins.as_deref());
            records.push(stored.to_record(&request.namespace, *digest, bins, now));
        }

        // Peek one record ahead so the final page carries no token.
        let resume = match (matching.next(), records.last()) {
            (Some(_), Some(last)) => Some(Self::encode_resume(&last.digest)),
            _ => None,
        };
        Ok(ScanPage { records, resume })
    }

    fn execute_background(&self, request: BackgroundRequest) -> StoreResult<JobId> {
        self.admit_read()?;
        self.namespace(&request.namespace)?;
        if request.ops.is_empty() {
            return Err(StoreError::parameter("background job needs at least one operation"));
        }
        if request.ops.iter().any(Operation::is_read) {
            return Err(StoreError::parameter("background jobs accept write operations only"));
        }

        let swept = self.inner.sweep_jobs(Utc::now());
        if swept > 0 {
            debug!(target: "recordgate::store", swept, "Forgot finished jobs");
        }

        let id = self.inner.next_job.fetch_add(1, Ordering::SeqCst);
        self.inner.record_job(id, JobState::InProgress);

        let inner = Arc::clone(&self.inner);
        let submitted = self.inner.pool.submit(move || {
            let state = Self::run_job(&inner, id, &request);
            inner.record_job(id, state);
        });
        if let Err(e) = submitted {
            self.inner.jobs.lock().remove(&id);
            return Err(match e {
                SubmitError::QueueFull => StoreError::Unavailable {
                    reason: "background job queue is full".to_string(),
                },
                SubmitError::Closed => StoreError::Unavailable {
                    reason: "store is shutting down".to_string(),
                },
                SubmitError::Spawn(e) => StoreError::Server {
                    reason: format!("failed to start job worker: {}", e),
                },
            });
        }

        debug!(target: "recordgate::store", job = id, "Background job accepted");
        Ok(JobId(id))
    }

    fn job_status(&self, job: JobId) -> StoreResult<JobState> {
        self.admit_read()?;
        self.inner
            .jobs
            .lock()
            .get(&job.0)
            .map(|entry| entry.state.clone())
            .ok_or(StoreError::JobNotFound { job: job.0 })
    }

    fn info(&self, node: Option<&str>, commands: &[String]) -> StoreResult<InfoResponse> {
        let target = {
            let down = self.inner.down_nodes.lock();
            match node {
                Some(name) => {
                    if !self.inner.nodes.iter().any(|n| n == name) {
                        return Err(StoreError::NodeNotFound {
                            node: name.to_string(),
                        });
                    }
                    if down.contains(name) {
                        return Err(StoreError::Unavailable {
                            reason: format!("node {} unreachable", name),
                        });
                    }
                    name.to_string()
                }
                None => self
                    .inner
                    .nodes
                    .iter()
                    .find(|n| !down.contains(*n))
                    .cloned()
                    .ok_or_else(|| StoreError::Unavailable {
                        reason: "no cluster node reachable".to_string(),
                    })?,
            }
        };
        if let Some(Fault::Unavailable) = *self.inner.fault.lock() {
            return Err(StoreError::Unavailable {
                reason: "cluster unreachable".to_string(),
            });
        }

        let responses = commands
            .iter()
            .map(|c| (c.clone(), self.info_command(&target, c)))
            .collect();
        Ok(InfoResponse {
            node: target,
            responses,
        })
    }

    fn nodes(&self) -> StoreResult<Vec<String>> {
        self.admit_read()?;
        Ok(self.inner.nodes.clone())
    }
}

fn stored_user_key(key: &UserKey) -> Option<UserKey> {
    match key {
        UserKey::Digest(_) => None,
        other => Some(other.clone()),
    }
}
