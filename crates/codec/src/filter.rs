//! Filter expression decoder.
//!
//! `filterexp` carries the store's own expression bytes, Base64url-encoded.
//! The gateway only checks that the store parser accepts them; the parsed
//! [`Expression`] is handed to the store as is.

use base64::Engine;
use recordgate_store::Expression;
use thiserror::Error;
use tracing::debug;

use crate::BASE64URL;

/// Filter decoding failure. A client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Not Base64url, or rejected by the expression parser
    #[error("invalid filter expression: {reason}")]
    Invalid {
        /// Details
        reason: String,
    },
}

/// Decode a `filterexp` token.
pub fn decode(token: &str) -> Result<Expression, FilterError> {
    let bytes = BASE64URL.decode(token).map_err(|e| FilterError::Invalid {
        reason: format!("not base64url: {}", e),
    })?;
    let expr = Expression::from_bytes(&bytes).map_err(|e| FilterError::Invalid {
        reason: e.to_string(),
    })?;
    debug!(target: "recordgate::codec", bytes = bytes.len(), "Decoded filter expression");
    Ok(expr)
}

/// Decode an optional `filterexp` parameter. Empty counts as absent.
pub fn decode_opt(token: Option<&str>) -> Result<Option<Expression>, FilterError> {
    match token.filter(|t| !t.is_empty()) {
        Some(t) => decode(t).map(Some),
        None => Ok(None),
    }
}

/// Encode an expression as a `filterexp` token.
pub fn encode(expr: &Expression) -> Result<String, FilterError> {
    let bytes = expr.to_bytes().map_err(|e| FilterError::Invalid {
        reason: e.to_string(),
    })?;
    Ok(BASE64URL.encode(bytes))
}
