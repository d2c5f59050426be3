//! # Recordgate Server
//!
//! HTTP surface of the gateway.
//!
//! | Route | Methods |
//! |-------|---------|
//! | `/v1/kvs/{ns}[/{set}]/{key}` | GET, HEAD, POST, PUT, PATCH, DELETE |
//! | `/v1/operate/{ns}[/{set}]/{key}` | POST |
//! | `/v1/scan/{ns}[/{set}]` | GET |
//! | `/v2/execute/scan/{ns}[/{set}]` | POST |
//! | `/v2/execute/scan/status/{task_id}` | GET |
//! | `/v1/info[/{node}]` | POST |
//! | `/v1/cluster` | GET |
//!
//! Every body is JSON or MessagePack, chosen per request by `Content-Type`
//! and `Accept`.

#![warn(missing_docs)]

pub mod config;
mod error;
mod handlers;
mod middleware;
mod negotiate;
pub mod request;
pub mod response;
mod server;

pub use config::{build_cli, CliArgs, ConfigError, GatewayConfig, ServerConfig, CONFIG_FILE_NAME};
pub use error::{status_for, ApiError};
pub use handlers::AppState;
pub use middleware::{TracingLayer, TracingService};
pub use negotiate::Negotiated;
pub use server::{build_router, GatewayServer};
