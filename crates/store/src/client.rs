//! The store client contract.

use std::collections::BTreeMap;

use recordgate_core::{Address, Bins, Operation, Record};

use crate::error::StoreResult;
use crate::expression::Expression;

/// What a write does when the record does or does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordExistsAction {
    /// Create or merge bins into an existing record
    #[default]
    Update,
    /// Merge bins; fail if the record does not exist
    UpdateOnly,
    /// Create or replace all bins
    Replace,
    /// Replace all bins; fail if the record does not exist
    ReplaceOnly,
    /// Create; fail if the record exists
    CreateOnly,
}

/// Options for single-record reads.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Bin projection; `None` reads every bin
    pub bins: Option<Vec<String>>,
    /// Predicate the record must satisfy
    pub filter: Option<Expression>,
}

/// Options for single-record writes.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Existence semantics
    pub exists: RecordExistsAction,
    /// Expected generation
    pub generation: Option<u32>,
    /// Expiration in seconds from now; `None` keeps the current expiration
    pub expiration: Option<u32>,
}

/// One page of a namespace or set scan.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Namespace to scan
    pub namespace: String,
    /// Set to scan; `None` scans the whole namespace
    pub set: Option<String>,
    /// Upper bound on records returned
    pub max_records: usize,
    /// Resume token from the previous page
    pub resume: Option<String>,
    /// Predicate every returned record must satisfy
    pub filter: Option<Expression>,
    /// Bin projection
    pub bins: Option<Vec<String>>,
}

/// Result of one scan call.
#[derive(Debug, Clone)]
pub struct ScanPage {
    /// Records in scan order
    pub records: Vec<Record>,
    /// Token resuming strictly after the last record; `None` when no
    /// records remain
    pub resume: Option<String>,
}

/// A scan-and-apply job.
#[derive(Debug, Clone)]
pub struct BackgroundRequest {
    /// Namespace to scan
    pub namespace: String,
    /// Set to scan; `None` scans the whole namespace
    pub set: Option<String>,
    /// Predicate selecting records to modify
    pub filter: Option<Expression>,
    /// Write operations applied to each selected record
    pub ops: Vec<Operation>,
}

/// Store-assigned background job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// Progress of a background job as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Still running
    InProgress,
    /// Finished successfully
    Done {
        /// Number of records modified
        records: u64,
    },
    /// Finished with an error
    Failed {
        /// Failure description
        reason: String,
    },
}

impl JobState {
    /// Whether the job has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::InProgress)
    }
}

/// Responses to info commands from one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoResponse {
    /// Node that answered
    pub node: String,
    /// Command to response text
    pub responses: BTreeMap<String, String>,
}

/// Operations the gateway issues against the store.
///
/// Calls are synchronous; implementations must be safe to share between
/// request workers and the task poller.
pub trait StoreClient: Send + Sync {
    /// Read a record.
    fn get(&self, address: &Address, options: &ReadOptions) -> StoreResult<Record>;

    /// Whether a record exists and satisfies `filter`.
    fn exists(&self, address: &Address, filter: Option<&Expression>) -> StoreResult<bool>;

    /// Write bins. `Null` values remove bins.
    fn put(&self, address: &Address, bins: &Bins, options: &WriteOptions) -> StoreResult<()>;

    /// Delete a record, returning whether it existed.
    fn delete(&self, address: &Address, options: &WriteOptions) -> StoreResult<bool>;

    /// Apply operations atomically to one record and return the read results.
    fn operate(
        &self,
        address: &Address,
        ops: &[Operation],
        options: &WriteOptions,
    ) -> StoreResult<Record>;

    /// Fetch one page of a scan.
    fn scan_page(&self, request: &ScanRequest) -> StoreResult<ScanPage>;

    /// Accept a background job. Returns as soon as the job is accepted.
    fn execute_background(&self, request: BackgroundRequest) -> StoreResult<JobId>;

    /// Current state of a background job.
    fn job_status(&self, job: JobId) -> StoreResult<JobState>;

    /// Send info commands to a node (any node when `node` is `None`).
    fn info(&self, node: Option<&str>, commands: &[String]) -> StoreResult<InfoResponse>;

    /// Names of the cluster's nodes.
    fn nodes(&self) -> StoreResult<Vec<String>>;
}
