//! Content negotiation.
//!
//! [`Negotiated`] picks the request and response codecs once per request
//! from `Content-Type` and `Accept`. Handlers decode and encode through it
//! and never look at a media type themselves.

use axum::body::Bytes;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use recordgate_codec::WireCodec;
use recordgate_executor::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// Codecs selected for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Codec for the request body
    pub request: WireCodec,
    /// Codec for the response body
    pub response: WireCodec,
}

impl Negotiated {
    /// Negotiate from request headers. Without an `Accept` header the
    /// response uses the request's format.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, Error> {
        let request = WireCodec::from_content_type(header_str(headers, header::CONTENT_TYPE)?)?;
        let response = WireCodec::from_accept(header_str(headers, header::ACCEPT)?, request)?;
        Ok(Negotiated { request, response })
    }

    /// Decode a request body.
    pub fn decode<T: DeserializeOwned>(&self, body: &Bytes) -> Result<T, Error> {
        if body.is_empty() {
            return Err(Error::InvalidPayload {
                reason: "request body is empty".to_string(),
            });
        }
        Ok(self.request.decode(body)?)
    }

    /// Encode a response body with `status`.
    pub fn reply<T: Serialize>(&self, status: StatusCode, body: &T) -> Result<Response, Error> {
        let bytes = self.response.encode(body)?;
        Ok((
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(self.response.media_type()),
            )],
            bytes,
        )
            .into_response())
    }

    /// Turn a handler outcome into a response, rendering errors in the
    /// response format.
    pub fn respond(&self, result: Result<Response, Error>) -> Response {
        match result {
            Ok(resp) => resp,
            Err(error) => ApiError::new(error, self.response).into_response(),
        }
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Result<Option<&str>, Error> {
    headers
        .get(&name)
        .map(|v| {
            v.to_str().map_err(|_| Error::UnsupportedMediaType {
                media_type: format!("non-ASCII {} header", name),
            })
        })
        .transpose()
}

impl<S> FromRequestParts<S> for Negotiated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Negotiated::from_headers(&parts.headers).map_err(|e| {
            // Best effort: answer in the body's format if that part was valid.
            let codec = header_str(&parts.headers, header::CONTENT_TYPE)
                .ok()
                .and_then(|h| WireCodec::from_content_type(h).ok())
                .unwrap_or_default();
            ApiError::new(e, codec)
        })
    }
}
