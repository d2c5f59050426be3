//! Shared helpers for the gateway suite.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use recordgate::{
    Address, Bins, ExecuteTask, Gateway, MemoryStore, ScanConfig, StoreClient,
    TaskRegistryConfig, TaskStatus, UserKey, Value,
};
use recordgate_store::WriteOptions;

pub const NS: &str = "test";
pub const SET: &str = "demo";

/// Gateway over a fresh store, with fast task polling.
pub fn gateway() -> (MemoryStore, Gateway) {
    gateway_with(ScanConfig::default(), fast_tasks())
}

pub fn gateway_with(scan: ScanConfig, tasks: TaskRegistryConfig) -> (MemoryStore, Gateway) {
    let store = MemoryStore::default();
    let gw = Gateway::new(Arc::new(store.clone()), scan, tasks).unwrap();
    (store, gw)
}

pub fn fast_tasks() -> TaskRegistryConfig {
    TaskRegistryConfig {
        poll_interval_ms: 5,
        ..Default::default()
    }
}

pub fn addr(key: i64) -> Address {
    Address::new(NS, Some(SET), UserKey::Integer(key))
}

pub fn int_bins(name: &str, n: i64) -> Bins {
    let mut bins = Bins::new();
    bins.insert(name.to_string(), Value::Int(n));
    bins
}

/// Write `keys` into the test set with bin `integer = key`.
pub fn seed(store: &MemoryStore, keys: impl IntoIterator<Item = i64>) {
    for key in keys {
        store
            .put(&addr(key), &int_bins("integer", key), &WriteOptions::default())
            .unwrap();
    }
}

/// Poll until the task leaves RUNNING.
pub fn wait_terminal(gw: &Gateway, task_id: &str) -> ExecuteTask {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let task = gw.task_status(task_id).unwrap();
        if task.status != TaskStatus::Running {
            return task;
        }
        assert!(Instant::now() < deadline, "task {} never finished", task_id);
        std::thread::sleep(Duration::from_millis(5));
    }
}
