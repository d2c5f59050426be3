//! # Recordgate Store
//!
//! The gateway talks to the record store exclusively through the
//! [`StoreClient`] trait. Connection pooling, cluster discovery and the
//! wire protocol belong to whatever implements it.
//!
//! This crate provides:
//! - [`StoreClient`] and its request/response types
//! - [`StoreError`] - every failure a store call can report
//! - [`Expression`] - the store-native predicate tree and its byte parser
//! - [`MemoryStore`] - an in-process store used for development and tests
//!
//! ## Digests
//!
//! Record digests are computed here, by the store side, from the set name
//! and the typed user key. The gateway never hashes keys itself.

#![warn(missing_docs)]

mod background;
mod client;
mod digest;
mod error;
mod expression;
mod memory;
mod ops;

pub use client::{
    BackgroundRequest, InfoResponse, JobId, JobState, ReadOptions, RecordExistsAction, ScanPage,
    ScanRequest, StoreClient, WriteOptions,
};
pub use digest::compute_digest;
pub use error::{StoreError, StoreResult};
pub use expression::{BinKind, Expression};
pub use memory::{Fault, MemoryStore, MemoryStoreConfig};
