//! HTTP error mapping.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use recordgate_codec::WireCodec;
use recordgate_executor::{Error, ErrorKind};

use crate::response::ErrorBody;

/// Error wrapper that renders a gateway error in the negotiated format.
#[derive(Debug)]
pub struct ApiError {
    /// The error
    pub error: Error,
    /// Format for the error body
    pub codec: WireCodec,
}

impl ApiError {
    /// Wrap an error for a response in `codec`.
    pub fn new(error: Error, codec: WireCodec) -> Self {
        ApiError { error, codec }
    }

    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        status_for(&self.error)
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error, WireCodec::default())
    }
}

/// Map an error to its HTTP status.
pub fn status_for(error: &Error) -> StatusCode {
    match error.kind() {
        ErrorKind::ClientError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::StoreFailure => match error {
            Error::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            e if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            s if s.is_server_error() => {
                tracing::warn!(target: "recordgate::http", status = s.as_u16(), error = %self.error, "Request failed")
            }
            s => tracing::debug!(target: "recordgate::http", status = s.as_u16(), error = %self.error, "Request rejected"),
        }

        let body = ErrorBody::from(&self.error);
        // An error body always encodes; fall back to JSON text if it somehow does not.
        let (codec, bytes) = match self.codec.encode(&body) {
            Ok(bytes) => (self.codec, bytes),
            Err(_) => (
                WireCodec::Json,
                serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec()),
            ),
        };
        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(codec.media_type()),
            )],
            bytes,
        )
            .into_response()
    }
}
