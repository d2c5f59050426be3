//! Core types for Recordgate
//!
//! This crate defines the request-scoped values that flow between the HTTP
//! surface, the codecs and the store client:
//! - Value: tagged union for every bin value the store can hold
//! - Address: namespace / optional set / typed user key
//! - Digest: fixed-width record identifier computed by the store
//! - Record: bins plus generation and expiration metadata
//! - Operation: single-record read/write operations used by operate and
//!   background execute jobs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod operation;
pub mod record;
pub mod value;

pub use address::{Address, Digest, KeyType, UserKey, DIGEST_LEN};
pub use operation::Operation;
pub use record::{Bins, Record};
pub use value::Value;
