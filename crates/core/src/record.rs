//! Records as returned by the store.

use std::collections::BTreeMap;

use crate::address::{Address, Digest};
use crate::value::Value;

/// Bin name to value mapping.
pub type Bins = BTreeMap<String, Value>;

/// A record read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Address the record was read under. For records found by scan this
    /// carries the stored user key, or the digest when no user key is stored.
    pub address: Address,
    /// Digest of the record
    pub digest: Digest,
    /// Bin values
    pub bins: Bins,
    /// Write generation, incremented on every successful write
    pub generation: u32,
    /// Seconds until expiration; `None` if the record never expires
    pub expiration: Option<u32>,
}

impl Record {
    /// Get a bin by name.
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }
}
