//! HTTP request types.
//!
//! Query parameters arrive as raw strings and are parsed here so that every
//! malformed value becomes a gateway client error rather than an extractor
//! rejection.

use std::str::FromStr;

use axum::extract::{FromRequestParts, MatchedPath};
use axum::http::request::Parts;
use percent_encoding::percent_decode_str;
use recordgate_codec::{filter, key, WireCodec};
use recordgate_core::{Address, Operation};
use recordgate_executor::{Error, ScanSpec, WriteParams};
use recordgate_store::Expression;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const WILDCARD: &str = "{*path}";

/// Tail of a wildcard record route as it appeared on the wire.
///
/// The tail is split on `/` before percent-decoding, so a key containing
/// an encoded `/` (`%2F`) stays one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPath(String);

impl RecordPath {
    /// Percent-decoded path segments.
    pub fn segments(&self) -> Result<Vec<String>, Error> {
        self.0
            .split('/')
            .map(|segment| {
                percent_decode_str(segment)
                    .decode_utf8()
                    .map(|s| s.into_owned())
                    .map_err(|_| Error::InvalidKey {
                        reason: format!("path segment '{}' is not valid UTF-8", segment),
                    })
            })
            .collect()
    }
}

impl From<&str> for RecordPath {
    fn from(raw: &str) -> Self {
        RecordPath(raw.to_string())
    }
}

impl<S> FromRequestParts<S> for RecordPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let prefix = parts
            .extensions
            .get::<MatchedPath>()
            .and_then(|m| m.as_str().strip_suffix(WILDCARD).map(str::to_string));
        prefix
            .and_then(|p| parts.uri.path().strip_prefix(p.as_str()).map(RecordPath::from))
            .ok_or_else(|| {
                ApiError::new(
                    Error::Internal {
                        reason: format!("{} is not a wildcard record route", parts.uri.path()),
                    },
                    WireCodec::default(),
                )
            })
    }
}

/// Body of operate and execute requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsBody {
    /// Operations in application order
    pub ops_list: Vec<Operation>,
}

/// Query parameters for single-record requests.
#[derive(Debug, Default, Deserialize)]
pub struct RecordParams {
    /// STRING, INTEGER, BYTES or DIGEST
    pub keytype: Option<String>,
    /// Base64url filter expression
    pub filterexp: Option<String>,
    /// Comma-separated bin projection
    pub bins: Option<String>,
    /// Expiration seconds for writes
    pub ttl: Option<String>,
    /// Expected generation for writes
    pub generation: Option<String>,
}

impl RecordParams {
    /// Decode the wildcard path tail `ns[/set]/key` into an address.
    pub fn address(&self, path: &RecordPath) -> Result<Address, Error> {
        let segments = path.segments()?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        Ok(key::decode(&segments, self.keytype.as_deref())?)
    }

    /// Decoded `filterexp`, if present.
    pub fn filter(&self) -> Result<Option<Expression>, Error> {
        Ok(filter::decode_opt(self.filterexp.as_deref())?)
    }

    /// Bin projection, if present.
    pub fn bins(&self) -> Option<Vec<String>> {
        parse_bins(self.bins.as_deref())
    }

    /// Expiration for writes.
    pub fn ttl(&self) -> Result<Option<u32>, Error> {
        parse_number("ttl", self.ttl.as_deref())
    }

    /// Generation and expiration for writes.
    pub fn write_params(&self) -> Result<WriteParams, Error> {
        Ok(WriteParams {
            generation: parse_number("generation", self.generation.as_deref())?,
            ttl: self.ttl()?,
        })
    }
}

/// Query parameters for scans.
#[derive(Debug, Default, Deserialize)]
pub struct ScanParams {
    /// Page size
    #[serde(rename = "maxRecords")]
    pub max_records: Option<String>,
    /// Token from the previous page
    pub from: Option<String>,
    /// Base64url filter expression
    pub filterexp: Option<String>,
    /// Comma-separated bin projection
    pub bins: Option<String>,
}

impl ScanParams {
    /// Scan over `namespace` and optional `set`.
    pub fn spec(&self, namespace: &str, set: Option<&str>) -> Result<ScanSpec, Error> {
        Ok(ScanSpec::new(namespace, set)
            .with_filter(filter::decode_opt(self.filterexp.as_deref())?)
            .with_bins(parse_bins(self.bins.as_deref())))
    }

    /// Requested page size.
    pub fn max_records(&self) -> Result<Option<usize>, Error> {
        parse_number("maxRecords", self.max_records.as_deref())
    }

    /// Resume token; empty counts as absent.
    pub fn from_token(&self) -> Option<&str> {
        self.from.as_deref().filter(|t| !t.is_empty())
    }
}

/// Query parameters for execute submissions.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteParams {
    /// Base64url filter expression selecting records to apply to
    pub filterexp: Option<String>,
}

impl ExecuteParams {
    /// Scan over `namespace` and optional `set`.
    pub fn spec(&self, namespace: &str, set: Option<&str>) -> Result<ScanSpec, Error> {
        Ok(ScanSpec::new(namespace, set).with_filter(filter::decode_opt(
            self.filterexp.as_deref(),
        )?))
    }
}

fn parse_bins(bins: Option<&str>) -> Option<Vec<String>> {
    let names: Vec<String> = bins?
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

fn parse_number<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_request(format!("{} must be a non-negative integer, got '{}'", name, s))),
    }
}
