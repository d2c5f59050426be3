//! Gateway Tests
//!
//! End-to-end behaviour of the gateway against the in-process store:
//! - pagination: every record exactly once, page counts
//! - tasks: execute lifecycle, idempotent status, unknown ids
//! - filters: selectivity on reads, scans and execute jobs
//! - codecs: key codec and wire formats feeding the gateway

mod common;

mod codecs;
mod filters;
mod pagination;
mod tasks;
