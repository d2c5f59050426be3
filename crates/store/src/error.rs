//! Store error types.
//!
//! | Category | Variants |
//! |----------|----------|
//! | Not Found | `NamespaceNotFound`, `RecordNotFound`, `FilteredOut`, `NodeNotFound`, `JobNotFound` |
//! | Conflict | `RecordExists`, `GenerationMismatch` |
//! | Validation | `InvalidExpression`, `InvalidResumeToken`, `Parameter` |
//! | System | `Timeout`, `Unavailable`, `Server` |
//!
//! `Timeout::in_doubt` is the only carrier of write doubt. It is set by the
//! store, never by its callers.

use thiserror::Error;

/// Result type for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by a store client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Namespace does not exist
    #[error("namespace not found: {namespace}")]
    NamespaceNotFound {
        /// Namespace name
        namespace: String,
    },

    /// Record does not exist
    #[error("record not found")]
    RecordNotFound,

    /// Record exists but the read predicate evaluated false
    #[error("record filtered out by predicate")]
    FilteredOut,

    /// Named node is not part of the cluster
    #[error("node not found: {node}")]
    NodeNotFound {
        /// Node name
        node: String,
    },

    /// Background job id is unknown to the store
    #[error("job not found: {job}")]
    JobNotFound {
        /// Job id
        job: u64,
    },

    /// Create-only write on an existing record
    #[error("record already exists")]
    RecordExists,

    /// Expected generation did not match
    #[error("generation mismatch: expected {expected}, actual {actual}")]
    GenerationMismatch {
        /// Generation the caller expected
        expected: u32,
        /// Generation the record has
        actual: u32,
    },

    /// Expression bytes were rejected by the parser
    #[error("invalid expression: {reason}")]
    InvalidExpression {
        /// Parser diagnostic
        reason: String,
    },

    /// Scan resume token was not produced by this store
    #[error("invalid resume token: {reason}")]
    InvalidResumeToken {
        /// Parser diagnostic
        reason: String,
    },

    /// Request parameters are invalid (bin type mismatch, bad operation)
    #[error("parameter error: {reason}")]
    Parameter {
        /// Details
        reason: String,
    },

    /// The call timed out
    #[error("timeout (in doubt: {in_doubt})")]
    Timeout {
        /// Whether a write may have been applied
        in_doubt: bool,
    },

    /// Node or cluster unreachable, or the cluster is changing
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Details
        reason: String,
    },

    /// Any other server-side failure
    #[error("server error: {reason}")]
    Server {
        /// Details
        reason: String,
    },
}

impl StoreError {
    /// Create a parameter error.
    pub fn parameter(reason: impl Into<String>) -> Self {
        StoreError::Parameter {
            reason: reason.into(),
        }
    }

    /// Whether a write's effect is unknown.
    pub fn in_doubt(&self) -> bool {
        matches!(self, StoreError::Timeout { in_doubt: true })
    }
}
