//! The gateway facade.
//!
//! [`Gateway`] owns the store client, the scan paginator and the task
//! registry, and exposes one method per HTTP operation. Inputs are already
//! decoded; outputs are domain types. Every method is synchronous and may
//! block on the store.

use std::sync::Arc;

use recordgate_core::{Address, Bins, Operation, Record};
use recordgate_store::{
    Expression, InfoResponse, ReadOptions, RecordExistsAction, StoreClient, WriteOptions,
};
use tracing::debug;

use crate::config::{ScanConfig, TaskRegistryConfig};
use crate::error::{Error, Result};
use crate::scan::{ScanPage, ScanPaginator, ScanSpec};
use crate::tasks::{ExecuteTask, TaskRegistry};

/// Optional write parameters taken from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteParams {
    /// Expected generation
    pub generation: Option<u32>,
    /// Expiration in seconds; 0 means never expire
    pub ttl: Option<u32>,
}

impl WriteParams {
    fn options(&self, exists: RecordExistsAction) -> WriteOptions {
        WriteOptions {
            exists,
            generation: self.generation,
            expiration: self.ttl,
        }
    }
}

/// Entry point for every gateway operation.
pub struct Gateway {
    store: Arc<dyn StoreClient>,
    paginator: ScanPaginator,
    tasks: TaskRegistry,
}

impl Gateway {
    /// Create a gateway over `store`.
    pub fn new(
        store: Arc<dyn StoreClient>,
        scan: ScanConfig,
        tasks: TaskRegistryConfig,
    ) -> Result<Self> {
        let registry = TaskRegistry::new(Arc::clone(&store), tasks).map_err(|e| Error::Internal {
            reason: format!("failed to start task poller: {}", e),
        })?;
        Ok(Gateway {
            paginator: ScanPaginator::new(Arc::clone(&store), scan),
            tasks: registry,
            store,
        })
    }

    /// The store client.
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// The task registry.
    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    // ========================================================================
    // Single-record operations
    // ========================================================================

    /// Read a record. A record failing `filter` is not found.
    pub fn get_record(
        &self,
        address: &Address,
        filter: Option<Expression>,
        bins: Option<Vec<String>>,
    ) -> Result<Record> {
        debug!(target: "recordgate::gateway", %address, filtered = filter.is_some(), "get");
        let options = ReadOptions { bins, filter };
        Ok(self.store.get(address, &options)?)
    }

    /// Succeeds only if the record exists and satisfies `filter`.
    pub fn record_exists(&self, address: &Address, filter: Option<Expression>) -> Result<()> {
        debug!(target: "recordgate::gateway", %address, "exists");
        if self.store.exists(address, filter.as_ref())? {
            Ok(())
        } else {
            Err(Error::RecordNotFound)
        }
    }

    /// Create a record; fails with `RecordExists` if it is already there.
    pub fn create_record(&self, address: &Address, bins: &Bins, ttl: Option<u32>) -> Result<()> {
        Self::require_bins(bins)?;
        debug!(target: "recordgate::gateway", %address, bins = bins.len(), "create");
        let params = WriteParams {
            generation: None,
            ttl,
        };
        self.store
            .put(address, bins, &params.options(RecordExistsAction::CreateOnly))?;
        Ok(())
    }

    /// Replace every bin of an existing record.
    pub fn replace_record(&self, address: &Address, bins: &Bins, params: WriteParams) -> Result<()> {
        Self::require_bins(bins)?;
        debug!(target: "recordgate::gateway", %address, bins = bins.len(), "replace");
        self.store
            .put(address, bins, &params.options(RecordExistsAction::ReplaceOnly))?;
        Ok(())
    }

    /// Merge bins into an existing record. `Null` values remove bins.
    pub fn update_record(&self, address: &Address, bins: &Bins, params: WriteParams) -> Result<()> {
        Self::require_bins(bins)?;
        debug!(target: "recordgate::gateway", %address, bins = bins.len(), "update");
        self.store
            .put(address, bins, &params.options(RecordExistsAction::UpdateOnly))?;
        Ok(())
    }

    /// Delete a record.
    pub fn delete_record(&self, address: &Address, generation: Option<u32>) -> Result<()> {
        debug!(target: "recordgate::gateway", %address, "delete");
        let params = WriteParams {
            generation,
            ttl: None,
        };
        if self
            .store
            .delete(address, &params.options(RecordExistsAction::Update))?
        {
            Ok(())
        } else {
            Err(Error::RecordNotFound)
        }
    }

    /// Apply operations atomically to one record.
    pub fn operate(
        &self,
        address: &Address,
        ops: &[Operation],
        params: WriteParams,
    ) -> Result<Record> {
        if ops.is_empty() {
            return Err(Error::invalid_request("opsList must not be empty"));
        }
        debug!(target: "recordgate::gateway", %address, ops = ops.len(), "operate");
        Ok(self
            .store
            .operate(address, ops, &params.options(RecordExistsAction::Update))?)
    }

    fn require_bins(bins: &Bins) -> Result<()> {
        if bins.is_empty() {
            return Err(Error::invalid_request("record body must contain at least one bin"));
        }
        Ok(())
    }

    // ========================================================================
    // Scans and background tasks
    // ========================================================================

    /// Fetch one scan page.
    pub fn scan(
        &self,
        spec: &ScanSpec,
        max_records: Option<usize>,
        from: Option<&str>,
    ) -> Result<ScanPage> {
        Ok(self.paginator.scan_page(spec, max_records, from)?)
    }

    /// Submit a background execute job.
    pub fn submit_execute(&self, spec: &ScanSpec, ops: Vec<Operation>) -> Result<ExecuteTask> {
        Ok(self.tasks.submit(spec, ops)?)
    }

    /// Status of a submitted task.
    pub fn task_status(&self, task_id: &str) -> Result<ExecuteTask> {
        Ok(self.tasks.status(task_id)?)
    }

    // ========================================================================
    // Cluster
    // ========================================================================

    /// Send info commands to a node, or to any node.
    pub fn info(&self, node: Option<&str>, commands: &[String]) -> Result<InfoResponse> {
        debug!(target: "recordgate::gateway", ?node, commands = commands.len(), "info");
        Ok(self.store.info(node, commands)?)
    }

    /// Names of the cluster's nodes.
    pub fn nodes(&self) -> Result<Vec<String>> {
        Ok(self.store.nodes()?)
    }

    /// Stop the task poller.
    pub fn shutdown(&self) {
        self.tasks.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordgate_core::{UserKey, Value};
    use recordgate_store::{Fault, MemoryStore};

    fn gateway() -> (MemoryStore, Gateway) {
        let store = MemoryStore::default();
        let gw = Gateway::new(
            Arc::new(store.clone()),
            ScanConfig::default(),
            TaskRegistryConfig::default(),
        )
        .unwrap();
        (store, gw)
    }

    fn addr(key: &str) -> Address {
        Address::new("test", Some("demo"), UserKey::String(key.into()))
    }

    fn bins(n: i64) -> Bins {
        let mut b = Bins::new();
        b.insert("integer".into(), Value::Int(n));
        b
    }

    #[test]
    fn test_create_conflict_keeps_original() {
        let (_, gw) = gateway();
        gw.create_record(&addr("k"), &bins(1), None).unwrap();
        assert_eq!(
            gw.create_record(&addr("k"), &bins(2), None),
            Err(Error::RecordExists)
        );
        let record = gw.get_record(&addr("k"), None, None).unwrap();
        assert_eq!(record.bin("integer"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_filter_selectivity() {
        let (_, gw) = gateway();
        gw.create_record(&addr("k"), &bins(10), None).unwrap();
        let pass = Expression::gt(Expression::int_bin("integer"), Expression::int(1));
        let fail = Expression::le(Expression::int_bin("integer"), Expression::int(1));
        assert!(gw.get_record(&addr("k"), Some(pass), None).is_ok());
        assert_eq!(
            gw.get_record(&addr("k"), Some(fail.clone()), None),
            Err(Error::RecordNotFound)
        );
        assert_eq!(
            gw.record_exists(&addr("k"), Some(fail)),
            Err(Error::RecordNotFound)
        );
    }

    #[test]
    fn test_exists_on_missing_namespace() {
        let (_, gw) = gateway();
        let a = Address::new("nope", None, UserKey::String("k".into()));
        assert_eq!(
            gw.record_exists(&a, None).unwrap_err().kind(),
            crate::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_replace_and_update_require_record() {
        let (_, gw) = gateway();
        assert_eq!(
            gw.replace_record(&addr("k"), &bins(1), WriteParams::default()),
            Err(Error::RecordNotFound)
        );
        assert_eq!(
            gw.update_record(&addr("k"), &bins(1), WriteParams::default()),
            Err(Error::RecordNotFound)
        );
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_, gw) = gateway();
        assert_eq!(gw.delete_record(&addr("k"), None), Err(Error::RecordNotFound));
    }

    #[test]
    fn test_write_timeout_in_doubt() {
        let (store, gw) = gateway();
        store.inject_fault(Fault::Timeout { in_doubt: true });
        let err = gw.create_record(&addr("k"), &bins(1), None).unwrap_err();
        assert!(err.in_doubt());
        let err = gw.get_record(&addr("k"), None, None).unwrap_err();
        assert!(!err.in_doubt());
        assert!(err.is_timeout());
    }

    #[test]
    fn test_empty_bodies_rejected() {
        let (_, gw) = gateway();
        assert_eq!(
            gw.create_record(&addr("k"), &Bins::new(), None)
                .unwrap_err()
                .kind(),
            crate::ErrorKind::ClientError
        );
        assert_eq!(
            gw.operate(&addr("k"), &[], WriteParams::default())
                .unwrap_err()
                .kind(),
            crate::ErrorKind::ClientError
        );
    }
}
