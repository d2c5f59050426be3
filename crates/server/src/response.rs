//! HTTP response types.
//!
//! Every body is shared by both wire formats. Field names are camelCase.

use std::collections::BTreeMap;

use base64::Engine;
use chrono::SecondsFormat;
use recordgate_codec::BASE64URL;
use recordgate_core::{Bins, Record, UserKey, Value};
use recordgate_executor::{Error, ExecuteTask, ScanPage, TaskStatus};
use serde::{Deserialize, Serialize};

/// Reported `ttl` for records that never expire.
pub const NEVER_EXPIRES: i64 = -1;

/// Key of a returned record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBody {
    /// Namespace name
    pub namespace: String,
    /// `null` for the null set
    pub set_name: Option<String>,
    /// `null` when the record is addressed by digest only
    pub user_key: Value,
    /// Base64url digest
    pub digest: String,
}

/// A single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBody {
    /// Bin values by name
    pub bins: Bins,
    /// Write count since creation
    pub generation: u32,
    /// Seconds until expiration, or -1
    pub ttl: i64,
    /// Record key
    pub key: KeyBody,
}

impl From<Record> for RecordBody {
    fn from(record: Record) -> Self {
        let user_key = match record.address.user_key {
            UserKey::String(s) => Value::String(s),
            UserKey::Integer(i) => Value::Int(i),
            UserKey::Bytes(b) => Value::Blob(b),
            UserKey::Digest(_) => Value::Null,
        };
        RecordBody {
            bins: record.bins,
            generation: record.generation,
            ttl: record
                .expiration
                .map(i64::from)
                .unwrap_or(NEVER_EXPIRES),
            key: KeyBody {
                namespace: record.address.namespace,
                set_name: record.address.set,
                user_key,
                digest: BASE64URL.encode(record.digest.as_bytes()),
            },
        }
    }
}

/// Scan continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationBody {
    /// Pass as `from` to fetch the next page; `null` at the end
    pub next_token: Option<String>,
    /// Records in this page
    pub total_records: usize,
}

/// One scan page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanBody {
    /// Records in scan order
    pub records: Vec<RecordBody>,
    /// Continuation for the next page
    pub pagination: PaginationBody,
}

impl From<ScanPage> for ScanBody {
    fn from(page: ScanPage) -> Self {
        let total_records = page.records.len();
        ScanBody {
            records: page.records.into_iter().map(RecordBody::from).collect(),
            pagination: PaginationBody {
                next_token: page.cursor.next_token,
                total_records,
            },
        }
    }
}

/// Execute task state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBody {
    /// Id to poll with
    pub task_id: String,
    /// Current state
    pub status: TaskStatus,
    /// RFC 3339
    pub submitted_at: String,
    /// Records touched, once complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_processed: Option<u64>,
    /// Failure message, once failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ExecuteTask> for TaskBody {
    fn from(task: ExecuteTask) -> Self {
        TaskBody {
            task_id: task.id.to_string(),
            status: task.status,
            submitted_at: task.submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            records_processed: task.records,
            error: task.error,
        }
    }
}

/// Cluster membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterBody {
    /// Node names
    pub nodes: Vec<String>,
}

/// Info command responses keyed by command.
pub type InfoBody = BTreeMap<String, String>;

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable error category
    pub error_kind: String,
    /// Human-readable detail
    pub message: String,
    /// Whether a write may have been applied
    pub in_doubt: bool,
}

impl From<&Error> for ErrorBody {
    fn from(error: &Error) -> Self {
        ErrorBody {
            error_kind: error.kind().as_str().to_string(),
            message: error.to_string(),
            in_doubt: error.in_doubt(),
        }
    }
}
