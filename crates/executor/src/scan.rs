//! Scan pagination controller.
//!
//! One call fetches one page: the paginator asks the store for exactly the
//! requested number of records, starting after the `from` token, and hands
//! back the store's own resume token as `next_token`. Tokens are never
//! inspected here.
//!
//! A scan that fails partway is reported as [`ScanError::Partial`], never
//! as a short page; a `None` next token always means the data is
//! exhausted.

use std::sync::Arc;

use recordgate_core::Record;
use recordgate_store::{Expression, ScanRequest, StoreClient, StoreError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ScanConfig;

/// What to scan. Also the selection of a background execute job.
#[derive(Debug, Clone, Default)]
pub struct ScanSpec {
    /// Namespace
    pub namespace: String,
    /// Set; `None` covers the whole namespace
    pub set: Option<String>,
    /// Store-native predicate
    pub filter: Option<Expression>,
    /// Bin projection
    pub bins: Option<Vec<String>>,
}

impl ScanSpec {
    /// Scan every record of a namespace or set.
    pub fn new(namespace: impl Into<String>, set: Option<&str>) -> Self {
        ScanSpec {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            filter: None,
            bins: None,
        }
    }

    /// Restrict to records matching `filter`.
    pub fn with_filter(mut self, filter: Option<Expression>) -> Self {
        self.filter = filter;
        self
    }

    /// Project to `bins`.
    pub fn with_bins(mut self, bins: Option<Vec<String>>) -> Self {
        self.bins = bins;
        self
    }
}

/// Where the next page starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor {
    /// Token for the next page; `None` when no records remain
    pub next_token: Option<String>,
}

impl ScanCursor {
    /// Whether the scan has reached the end of its data.
    pub fn is_exhausted(&self) -> bool {
        self.next_token.is_none()
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct ScanPage {
    /// Records in scan order
    pub records: Vec<Record>,
    /// Continuation
    pub cursor: ScanCursor,
}

/// Scan failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Page size is zero or above the configured limit
    #[error("maxRecords must be between 1 and {max}, got {requested}")]
    InvalidPageSize {
        /// Requested page size
        requested: usize,
        /// Configured limit
        max: usize,
    },

    /// The store refused the request (unknown namespace, bad token or
    /// filter)
    #[error("scan rejected: {0}")]
    Rejected(StoreError),

    /// The store failed mid-scan
    #[error("scan failed before completion: {0}")]
    Partial(StoreError),
}

/// Issues paged scans against the store.
pub struct ScanPaginator {
    store: Arc<dyn StoreClient>,
    config: ScanConfig,
}

impl ScanPaginator {
    /// Create a paginator.
    pub fn new(store: Arc<dyn StoreClient>, config: ScanConfig) -> Self {
        ScanPaginator { store, config }
    }

    /// Limits in effect.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Fetch one page.
    ///
    /// `max_records` defaults to the configured page size. An empty `from`
    /// is treated as absent.
    pub fn scan_page(
        &self,
        spec: &ScanSpec,
        max_records: Option<usize>,
        from: Option<&str>,
    ) -> Result<ScanPage, ScanError> {
        let max_records = max_records.unwrap_or(self.config.default_max_records);
        if max_records == 0 || max_records > self.config.max_records_limit {
            return Err(ScanError::InvalidPageSize {
                requested: max_records,
                max: self.config.max_records_limit,
            });
        }

        let request = ScanRequest {
            namespace: spec.namespace.clone(),
            set: spec.set.clone(),
            max_records,
            resume: from.filter(|t| !t.is_empty()).map(str::to_string),
            filter: spec.filter.clone(),
            bins: spec.bins.clone(),
        };

        let page = self.store.scan_page(&request).map_err(|e| match e {
            StoreError::Timeout { .. } | StoreError::Unavailable { .. } | StoreError::Server { .. } => {
                warn!(target: "recordgate::scan", namespace = %spec.namespace, error = %e, "Scan failed mid-stream");
                ScanError::Partial(e)
            }
            other => ScanError::Rejected(other),
        })?;

        debug!(
            target: "recordgate::scan",
            namespace = %spec.namespace,
            set = ?spec.set,
            records = page.records.len(),
            more = page.resume.is_some(),
            "Scan page"
        );

        Ok(ScanPage {
            records: page.records,
            cursor: ScanCursor {
                next_token: page.resume,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordgate_core::{Address, Bins, UserKey, Value};
    use recordgate_store::{Fault, MemoryStore, RecordExistsAction, WriteOptions};
    use std::collections::HashSet;

    fn seeded(n: i64) -> MemoryStore {
        let store = MemoryStore::default();
        let opts = WriteOptions {
            exists: RecordExistsAction::CreateOnly,
            ..Default::default()
        };
        for i in 0..n {
            let address = Address::new("test", Some("demo"), UserKey::Integer(i));
            let mut bins = Bins::new();
            bins.insert("i".into(), Value::Int(i));
            store.put(&address, &bins, &opts).unwrap();
        }
        store
    }

    fn paginator(store: &MemoryStore) -> ScanPaginator {
        ScanPaginator::new(Arc::new(store.clone()), ScanConfig::default())
    }

    #[test]
    fn test_chained_pages_cover_every_record_once() {
        let store = seeded(101);
        let p = paginator(&store);
        let spec = ScanSpec::new("test", Some("demo"));

        let mut seen = HashSet::new();
        let mut sizes = Vec::new();
        let mut from: Option<String> = None;
        loop {
            let page = p.scan_page(&spec, Some(10), from.as_deref()).unwrap();
            sizes.push(page.records.len());
            for r in &page.records {
                assert!(seen.insert(r.digest), "duplicate record");
            }
            match page.cursor.next_token {
                Some(t) => from = Some(t),
                None => break,
            }
        }
        assert_eq!(seen.len(), 101);
        assert_eq!(sizes.len(), 11);
        assert_eq!(sizes.last(), Some(&1));
    }

    #[test]
    fn test_exact_multiple_has_no_empty_trailing_page() {
        let store = seeded(20);
        let p = paginator(&store);
        let spec = ScanSpec::new("test", Some("demo"));
        let first = p.scan_page(&spec, Some(10), None).unwrap();
        let second = p
            .scan_page(&spec, Some(10), first.cursor.next_token.as_deref())
            .unwrap();
        assert_eq!(second.records.len(), 10);
        assert!(second.cursor.is_exhausted());
    }

    #[test]
    fn test_page_size_limits() {
        let store = seeded(1);
        let p = paginator(&store);
        let spec = ScanSpec::new("test", None);
        assert!(matches!(
            p.scan_page(&spec, Some(0), None),
            Err(ScanError::InvalidPageSize { .. })
        ));
        assert!(matches!(
            p.scan_page(&spec, Some(10_001), None),
            Err(ScanError::InvalidPageSize { .. })
        ));
    }

    #[test]
    fn test_store_failure_is_partial_not_truncation() {
        let store = seeded(30);
        let p = paginator(&store);
        let spec = ScanSpec::new("test", Some("demo"));
        let first = p.scan_page(&spec, Some(10), None).unwrap();

        store.inject_fault(Fault::Unavailable);
        let err = p
            .scan_page(&spec, Some(10), first.cursor.next_token.as_deref())
            .unwrap_err();
        assert!(matches!(err, ScanError::Partial(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_unknown_namespace_is_rejected() {
        let store = seeded(0);
        let p = paginator(&store);
        let err = p
            .scan_page(&ScanSpec::new("missing", None), None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::Rejected(StoreError::NamespaceNotFound { .. })
        ));
    }
}
