//! Recordgate - HTTP gateway for a record-oriented store
//!
//! Recordgate exposes key/value reads and writes, paginated scans, and
//! background scan-and-apply jobs over HTTP, translating each request into
//! calls on a [`StoreClient`].
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use recordgate::{Gateway, MemoryStore, ScanConfig, TaskRegistryConfig};
//!
//! let store = Arc::new(MemoryStore::default());
//! let gateway = Gateway::new(store, ScanConfig::default(), TaskRegistryConfig::default())?;
//! let router = recordgate::server::build_router(recordgate::server::AppState::new(gateway));
//! ```
//!
//! # Architecture
//!
//! Requests are decoded by [`codec`], executed by the [`Gateway`], and
//! rendered by [`server`]. The store is reached only through the
//! [`StoreClient`] trait.

pub use recordgate_codec as codec;
pub use recordgate_core::{Address, Bins, Digest, KeyType, Operation, Record, UserKey, Value};
pub use recordgate_executor::*;
pub use recordgate_server as server;
pub use recordgate_store::{
    Expression, Fault, MemoryStore, MemoryStoreConfig, StoreClient, StoreError,
};
