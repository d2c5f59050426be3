//! Payload codec and media-type negotiation.
//!
//! Two wire formats are supported, chosen per request:
//!
//! | Codec | Media type | Notes |
//! |-------|------------|-------|
//! | [`WireCodec::Json`] | `application/json` | default; blobs and special floats use `$`-wrappers |
//! | [`WireCodec::MessagePack`] | `application/msgpack`, `application/x-msgpack` | blobs as `bin`, floats native |
//!
//! Both go through the same serde implementations, so request and
//! response types are written once.

use std::io::Cursor;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Payload failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Bytes are not valid in the selected format
    #[error("malformed {codec} payload: {reason}")]
    Malformed {
        /// Format name
        codec: &'static str,
        /// Parser diagnostic
        reason: String,
    },

    /// Bytes parse but do not have the shape the operation expects
    #[error("unexpected payload shape: {reason}")]
    SchemaMismatch {
        /// Details
        reason: String,
    },

    /// Neither supported format was requested
    #[error("unsupported media type: {media_type}")]
    UnsupportedMediaType {
        /// The rejected media type
        media_type: String,
    },

    /// A response could not be encoded
    #[error("failed to encode {codec} payload: {reason}")]
    Encode {
        /// Format name
        codec: &'static str,
        /// Details
        reason: String,
    },
}

/// The wire format of a request or response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WireCodec {
    /// JSON
    #[default]
    Json,
    /// MessagePack
    MessagePack,
}

impl WireCodec {
    /// JSON media type.
    pub const JSON_MEDIA_TYPE: &'static str = "application/json";
    /// MessagePack media type.
    pub const MSGPACK_MEDIA_TYPE: &'static str = "application/msgpack";

    /// Every supported codec.
    pub const ALL: [WireCodec; 2] = [WireCodec::Json, WireCodec::MessagePack];

    /// Canonical media type.
    pub fn media_type(&self) -> &'static str {
        match self {
            WireCodec::Json => Self::JSON_MEDIA_TYPE,
            WireCodec::MessagePack => Self::MSGPACK_MEDIA_TYPE,
        }
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            WireCodec::Json => "json",
            WireCodec::MessagePack => "msgpack",
        }
    }

    /// Match a single media type, ignoring parameters and case.
    pub fn from_media_type(media_type: &str) -> Option<WireCodec> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(WireCodec::Json),
            "application/msgpack" | "application/x-msgpack" => Some(WireCodec::MessagePack),
            _ => None,
        }
    }

    /// Codec for a request body. An absent `Content-Type` means JSON.
    pub fn from_content_type(header: Option<&str>) -> Result<WireCodec, PayloadError> {
        match header.map(str::trim).filter(|h| !h.is_empty()) {
            None => Ok(WireCodec::Json),
            Some(h) => Self::from_media_type(h).ok_or_else(|| PayloadError::UnsupportedMediaType {
                media_type: h.to_string(),
            }),
        }
    }

    /// Codec for a response body. An absent `Accept` or a wildcard means
    /// `fallback`; otherwise the first supported entry wins.
    pub fn from_accept(
        header: Option<&str>,
        fallback: WireCodec,
    ) -> Result<WireCodec, PayloadError> {
        let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(fallback);
        };
        for entry in header.split(',') {
            let essence = entry.split(';').next().unwrap_or("").trim();
            if essence == "*/*" || essence.eq_ignore_ascii_case("application/*") {
                return Ok(fallback);
            }
            if let Some(codec) = Self::from_media_type(essence) {
                return Ok(codec);
            }
        }
        Err(PayloadError::UnsupportedMediaType {
            media_type: header.to_string(),
        })
    }

    // ========================================================================
    // Encode / decode
    // ========================================================================

    /// Encode a value.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, PayloadError> {
        let encoded = match self {
            WireCodec::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
            WireCodec::MessagePack => rmp_serde::to_vec_named(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|reason| PayloadError::Encode {
            codec: self.name(),
            reason,
        })
    }

    /// Decode bytes into the shape `T` the operation expects.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, PayloadError> {
        match self {
            WireCodec::Json => decode_json(bytes),
            WireCodec::MessagePack => decode_msgpack(bytes),
        }
    }
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PayloadError> {
    use serde_json::error::Category;

    serde_json::from_slice(bytes).map_err(|e| match e.classify() {
        Category::Data => PayloadError::SchemaMismatch {
            reason: e.to_string(),
        },
        Category::Io | Category::Syntax | Category::Eof => PayloadError::Malformed {
            codec: "json",
            reason: e.to_string(),
        },
    })
}

fn decode_msgpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PayloadError> {
    use rmp_serde::decode::Error;

    let malformed = |reason: String| PayloadError::Malformed {
        codec: "msgpack",
        reason,
    };

    let mut cursor = Cursor::new(bytes);
    let mut de = rmp_serde::Deserializer::new(&mut cursor);
    let value = T::deserialize(&mut de).map_err(|e| match &e {
        // Serde's own shape complaints (missing field, unknown variant,
        // invalid type) surface as Syntax.
        Error::Syntax(_) | Error::TypeMismatch(_) | Error::OutOfRange | Error::LengthMismatch(_) => {
            PayloadError::SchemaMismatch {
                reason: e.to_string(),
            }
        }
        other => malformed(other.to_string()),
    })?;

    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(malformed(format!(
            "{} trailing bytes after payload",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}
