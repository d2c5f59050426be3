//! Error types for request execution.
//!
//! Every failure a gateway operation can report is an [`Error`]. Each
//! variant belongs to one [`ErrorKind`], which is what the HTTP layer maps
//! to a status code.
//!
//! # Categories
//!
//! | Kind | Variants |
//! |------|----------|
//! | `ClientError` | `InvalidKey`, `InvalidFilter`, `InvalidPayload`, `UnsupportedMediaType`, `InvalidRequest` |
//! | `NotFound` | `NamespaceNotFound`, `RecordNotFound`, `TaskNotFound`, `NodeNotFound` |
//! | `Conflict` | `RecordExists`, `GenerationMismatch` |
//! | `StoreFailure` | `StoreUnavailable`, `StoreTimeout`, `ScanIncomplete`, `StoreFailure` |
//! | `Overloaded` | `Overloaded` |
//! | `Internal` | `Internal` |
//!
//! Only `StoreTimeout` can carry `in_doubt`, and only when the store set it.

use std::fmt;

use thiserror::Error;

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request is invalid; retrying it unchanged will fail again
    ClientError,
    /// The addressed namespace, record, node or task does not exist
    NotFound,
    /// The request conflicts with the record's current state
    Conflict,
    /// The store failed or could not be reached
    StoreFailure,
    /// The gateway is at capacity
    Overloaded,
    /// A gateway bug or an unencodable response
    Internal,
}

impl ErrorKind {
    /// Name used in error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientError => "ClientError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::StoreFailure => "StoreFailure",
            ErrorKind::Overloaded => "Overloaded",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // ==================== Client Errors ====================
    /// Record path or key could not be decoded
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Details
        reason: String,
    },

    /// Filter expression could not be decoded or was rejected by the store
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// Details
        reason: String,
    },

    /// Request body is malformed or has the wrong shape
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// Details
        reason: String,
    },

    /// Neither supported wire format was requested
    #[error("unsupported media type: {media_type}")]
    UnsupportedMediaType {
        /// Media type as sent
        media_type: String,
    },

    /// Any other invalid input (parameters, operation lists, tokens)
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Details
        reason: String,
    },

    // ==================== Not Found ====================
    /// Namespace does not exist
    #[error("namespace not found: {namespace}")]
    NamespaceNotFound {
        /// Namespace name
        namespace: String,
    },

    /// Record does not exist or did not satisfy the request's filter
    #[error("record not found")]
    RecordNotFound,

    /// Task id was never issued or has been evicted
    #[error("task not found: {task_id}")]
    TaskNotFound {
        /// Requested task id
        task_id: String,
    },

    /// Node is not part of the cluster
    #[error("node not found: {node}")]
    NodeNotFound {
        /// Node name
        node: String,
    },

    // ==================== Conflict ====================
    /// Create on an existing record
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

    // ==================== Store Failures ====================
    /// Store or node unreachable
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// Details
        reason: String,
    },

    /// Store call timed out
    #[error("store timeout")]
    StoreTimeout {
        /// Whether a write may have been applied
        in_doubt: bool,
    },

    /// A scan failed before reaching the end of its data
    #[error("scan incomplete: {reason}")]
    ScanIncomplete {
        /// Details
        reason: String,
        /// Whether the store call timed out
        timed_out: bool,
    },

    /// Any other store-side failure
    #[error("store failure: {reason}")]
    StoreFailure {
        /// Details
        reason: String,
    },

    // ==================== Capacity ====================
    /// Gateway capacity exhausted
    #[error("overloaded: {reason}")]
    Overloaded {
        /// Details
        reason: String,
    },

    // ==================== Internal ====================
    /// Internal failure
    #[error("internal error: {reason}")]
    Internal {
        /// Details
        reason: String,
    },
}

impl Error {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidKey { .. }
            | Error::InvalidFilter { .. }
            | Error::InvalidPayload { .. }
            | Error::UnsupportedMediaType { .. }
            | Error::InvalidRequest { .. } => ErrorKind::ClientError,
            Error::NamespaceNotFound { .. }
            | Error::RecordNotFound
            | Error::TaskNotFound { .. }
            | Error::NodeNotFound { .. } => ErrorKind::NotFound,
            Error::RecordExists | Error::GenerationMismatch { .. } => ErrorKind::Conflict,
            Error::StoreUnavailable { .. }
            | Error::StoreTimeout { .. }
            | Error::ScanIncomplete { .. }
            | Error::StoreFailure { .. } => ErrorKind::StoreFailure,
            Error::Overloaded { .. } => ErrorKind::Overloaded,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether a write's effect is unknown.
    pub fn in_doubt(&self) -> bool {
        matches!(self, Error::StoreTimeout { in_doubt: true })
    }

    /// Whether the failure is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::StoreTimeout { .. } | Error::ScanIncomplete { timed_out: true, .. }
        )
    }

    /// Create an invalid request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }
}
