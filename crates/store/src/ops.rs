//! Operation application.
//!
//! Operations run in order against a working copy of a record's bins. The
//! caller commits the copy only if every operation succeeded.

use recordgate_core::{Bins, Operation, Value};

use crate::error::{StoreError, StoreResult};

/// Effect of a list of operations on one record.
#[derive(Debug, Default)]
pub(crate) struct Applied {
    /// Bins produced by read operations, in the order read
    pub results: Bins,
    /// Whether any operation modified the record
    pub modified: bool,
}

/// Apply `ops` to `bins`. On error `bins` may be partially modified and
/// must be discarded.
pub(crate) fn apply_operations(bins: &mut Bins, ops: &[Operation]) -> StoreResult<Applied> {
    let mut applied = Applied::default();

    for op in ops {
        match op {
            Operation::Put { bin, value } => {
                if value.is_null() {
                    bins.remove(bin);
                } else {
                    bins.insert(bin.clone(), value.clone());
                }
                applied.modified = true;
            }
            Operation::Add { bin, incr } => {
                let current = bins.get(bin).cloned();
                let next = add(bin, current.as_ref(), incr)?;
                bins.insert(bin.clone(), next);
                applied.modified = true;
            }
            Operation::Append { bin, value } => {
                let next = concat(bin, bins.get(bin), |s| format!("{}{}", s, value))?;
                bins.insert(bin.clone(), next);
                applied.modified = true;
            }
            Operation::Prepend { bin, value } => {
                let next = concat(bin, bins.get(bin), |s| format!("{}{}", value, s))?;
                bins.insert(bin.clone(), next);
                applied.modified = true;
            }
            Operation::DeleteBin { bin } => {
                bins.remove(bin);
                applied.modified = true;
            }
            Operation::Touch => {
                applied.modified = true;
            }
            Operation::Read { bin } => {
                if let Some(v) = bins.get(bin) {
                    applied.results.insert(bin.clone(), v.clone());
                }
            }
            Operation::Get => {
                applied
                    .results
                    .extend(bins.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }

    Ok(applied)
}

fn add(bin: &str, current: Option<&Value>, incr: &Value) -> StoreResult<Value> {
    match (current, incr) {
        (None, Value::Int(i)) => Ok(Value::Int(*i)),
        (None, Value::Float(f)) => Ok(Value::Float(*f)),
        (Some(Value::Int(a)), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| StoreError::parameter(format!("integer overflow adding to bin '{}'", bin))),
        (Some(Value::Float(a)), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Some(existing), incr) if matches!(incr, Value::Int(_) | Value::Float(_)) => {
            Err(StoreError::parameter(format!(
                "cannot add {} to {} bin '{}'",
                incr.type_name(),
                existing.type_name(),
                bin
            )))
        }
        (_, incr) => Err(StoreError::parameter(format!(
            "increment must be Int or Float, got {}",
            incr.type_name()
        ))),
    }
}

fn concat(bin: &str, current: Option<&Value>, f: impl Fn(&str) -> String) -> StoreResult<Value> {
    match current {
        None => Ok(Value::String(f(""))),
        Some(Value::String(s)) => Ok(Value::String(f(s))),
        Some(other) => Err(StoreError::parameter(format!(
            "cannot concatenate onto {} bin '{}'",
            other.type_name(),
            bin
        ))),
    }
}
