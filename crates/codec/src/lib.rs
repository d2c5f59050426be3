//! # Recordgate Codec
//!
//! Everything the gateway decodes from a request before it reaches the
//! store, and encodes into a response after it leaves.
//!
//! | Module | Input | Output |
//! |--------|-------|--------|
//! | [`key`] | path segments + `keytype` | [`Address`](recordgate_core::Address) |
//! | [`payload`] | body bytes + media type | typed request / response |
//! | [`filter`] | `filterexp` token | [`Expression`](recordgate_store::Expression) |
//!
//! Decoding errors never reach the store; each module owns its error type
//! and every variant is a client error.

#![warn(missing_docs)]

pub mod filter;
pub mod key;
pub mod payload;

pub use filter::FilterError;
pub use key::KeyDecodeError;
pub use payload::{PayloadError, WireCodec};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Base64url engine used for tokens carried in URLs. Encodes without
/// padding and accepts padded or unpadded input.
pub const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
