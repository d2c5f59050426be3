//! Single-record operations.
//!
//! Operations are applied in order, atomically, to one record by `operate`,
//! and to every matching record by a background execute job. On the wire
//! each operation is an object tagged by `operationType`:
//!
//! ```json
//! {"operationType": "ADD", "bin": "count", "incr": 1}
//! ```

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A read or write applied to a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operationType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Write a bin. Writing `Null` removes the bin.
    Put {
        /// Bin name
        bin: String,
        /// New value
        value: Value,
    },
    /// Add a number to an integer or float bin (missing bins start at zero).
    Add {
        /// Bin name
        bin: String,
        /// Increment, must be Int or Float
        incr: Value,
    },
    /// Append to a string bin.
    Append {
        /// Bin name
        bin: String,
        /// Suffix
        value: String,
    },
    /// Prepend to a string bin.
    Prepend {
        /// Bin name
        bin: String,
        /// Prefix
        value: String,
    },
    /// Remove a bin.
    DeleteBin {
        /// Bin name
        bin: String,
    },
    /// Reset the record's expiration and bump its generation.
    Touch,
    /// Read one bin.
    Read {
        /// Bin name
        bin: String,
    },
    /// Read every bin.
    Get,
}

impl Operation {
    /// Whether the operation only reads.
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::Read { .. } | Operation::Get)
    }

    /// The bin the operation targets, if it targets one.
    pub fn bin(&self) -> Option<&str> {
        match self {
            Operation::Put { bin, .. }
            | Operation::Add { bin, .. }
            | Operation::Append { bin, .. }
            | Operation::Prepend { bin, .. }
            | Operation::DeleteBin { bin }
            | Operation::Read { bin } => Some(bin),
            Operation::Touch | Operation::Get => None,
        }
    }
}
