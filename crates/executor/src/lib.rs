//! # Recordgate Executor
//!
//! Runs decoded gateway requests against a [`StoreClient`](recordgate_store::StoreClient).
//!
//! This crate provides:
//! - [`Gateway`] - one method per HTTP operation
//! - [`ScanPaginator`] - page-at-a-time scans with opaque continuation tokens
//! - [`TaskRegistry`] - background execute jobs, submitted synchronously
//!   and polled asynchronously
//! - [`Error`]/[`ErrorKind`] - the single error taxonomy the HTTP layer maps
//!
//! ## Threads
//!
//! Request handlers call the gateway from their own workers. Task state is
//! refreshed by the registry's poller thread, so a long job never occupies
//! a request worker.

#![warn(missing_docs)]

mod config;
mod convert;
mod error;
mod gateway;
mod scan;
mod tasks;

pub use config::{ScanConfig, TaskRegistryConfig};
pub use error::{Error, ErrorKind, Result};
pub use gateway::{Gateway, WriteParams};
pub use scan::{ScanCursor, ScanError, ScanPage, ScanPaginator, ScanSpec};
pub use tasks::{ExecuteTask, TaskError, TaskId, TaskRegistry, TaskStatus};
