//! Key codec.
//!
//! Turns the path of a record route into a typed [`Address`]:
//!
//! ```text
//! /v1/kvs/{namespace}/{key}          -> null set
//! /v1/kvs/{namespace}/{set}/{key}    -> named set
//! ```
//!
//! The `keytype` query parameter selects how the key segment is read:
//!
//! | keytype | key segment |
//! |---------|-------------|
//! | `STRING` (default) | used verbatim |
//! | `INTEGER` | base-10 signed 64-bit integer |
//! | `BYTES` | Base64url blob |
//! | `DIGEST` | Base64url, exactly 20 bytes |

use base64::Engine;
use recordgate_core::{Address, Digest, KeyType, UserKey, DIGEST_LEN};
use thiserror::Error;
use tracing::debug;

use crate::BASE64URL;

/// Key decoding failures. All are client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDecodeError {
    /// INTEGER key is not a base-10 signed 64-bit integer
    #[error("invalid integer key: {token}")]
    InvalidInteger {
        /// Offending key segment
        token: String,
    },

    /// BYTES or DIGEST key is not valid Base64url, or a digest has the
    /// wrong length
    #[error("invalid key encoding: {reason}")]
    InvalidEncoding {
        /// Details
        reason: String,
    },

    /// `keytype` is not one of the supported names
    #[error("unsupported key type: {keytype}")]
    UnsupportedKeyType {
        /// Value of the `keytype` parameter
        keytype: String,
    },

    /// Path does not have the namespace[/set]/key shape
    #[error("invalid record path: {reason}")]
    InvalidPath {
        /// Details
        reason: String,
    },
}

/// Parse the `keytype` parameter. Absent means STRING.
pub fn parse_key_type(keytype: Option<&str>) -> Result<KeyType, KeyDecodeError> {
    match keytype {
        None => Ok(KeyType::default()),
        Some(s) => KeyType::parse(s).ok_or_else(|| KeyDecodeError::UnsupportedKeyType {
            keytype: s.to_string(),
        }),
    }
}

/// Decode path segments and the `keytype` parameter into an address.
pub fn decode(segments: &[&str], keytype: Option<&str>) -> Result<Address, KeyDecodeError> {
    let key_type = parse_key_type(keytype)?;

    let (namespace, set, token) = match segments {
        [ns, key] => (*ns, None, *key),
        [ns, set, key] => (*ns, Some(*set), *key),
        _ => {
            return Err(KeyDecodeError::InvalidPath {
                reason: format!(
                    "expected namespace[/set]/key, got {} segments",
                    segments.len()
                ),
            })
        }
    };
    if namespace.is_empty() || set.map(str::is_empty).unwrap_or(false) || token.is_empty() {
        return Err(KeyDecodeError::InvalidPath {
            reason: "empty path segment".to_string(),
        });
    }

    let user_key = decode_user_key(token, key_type)?;
    debug!(target: "recordgate::codec", namespace, ?set, key_type = key_type.as_str(), "Decoded key");
    Ok(Address::new(namespace, set, user_key))
}

/// Interpret one key segment under `key_type`.
pub fn decode_user_key(token: &str, key_type: KeyType) -> Result<UserKey, KeyDecodeError> {
    match key_type {
        KeyType::String => Ok(UserKey::String(token.to_string())),
        KeyType::Integer => {
            token
                .parse::<i64>()
                .map(UserKey::Integer)
                .map_err(|_| KeyDecodeError::InvalidInteger {
                    token: token.to_string(),
                })
        }
        KeyType::Bytes => decode_base64(token).map(UserKey::Bytes),
        KeyType::Digest => {
            let bytes = decode_base64(token)?;
            Digest::from_slice(&bytes)
                .map(UserKey::Digest)
                .ok_or_else(|| KeyDecodeError::InvalidEncoding {
                    reason: format!("digest must be {} bytes, got {}", DIGEST_LEN, bytes.len()),
                })
        }
    }
}

fn decode_base64(token: &str) -> Result<Vec<u8>, KeyDecodeError> {
    BASE64URL
        .decode(token)
        .map_err(|e| KeyDecodeError::InvalidEncoding {
            reason: e.to_string(),
        })
}

/// Encode an address into path segments and the `keytype` it needs.
///
/// Inverse of [`decode`].
pub fn encode(address: &Address) -> (Vec<String>, KeyType) {
    let mut segments = vec![address.namespace.clone()];
    if let Some(set) = &address.set {
        segments.push(set.clone());
    }
    segments.push(encode_user_key(&address.user_key));
    (segments, address.user_key.key_type())
}

/// Encode a user key as a path segment.
pub fn encode_user_key(key: &UserKey) -> String {
    match key {
        UserKey::String(s) => s.clone(),
        UserKey::Integer(i) => i.to_string(),
        UserKey::Bytes(b) => BASE64URL.encode(b),
        UserKey::Digest(d) => BASE64URL.encode(d.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_segments_is_null_set() {
        let a = decode(&["test", "k1"], None).unwrap();
        assert_eq!(a.namespace, "test");
        assert_eq!(a.set, None);
        assert_eq!(a.user_key, UserKey::String("k1".into()));
    }

    #[test]
    fn test_three_segments_has_set() {
        let a = decode(&["test", "demo", "42"], Some("INTEGER")).unwrap();
        assert_eq!(a.set.as_deref(), Some("demo"));
        assert_eq!(a.user_key, UserKey::Integer(42));
    }

    #[test]
    fn test_keytype_is_case_insensitive() {
        assert!(decode(&["test", "-7"], Some("integer")).is_ok());
    }

    #[test]
    fn test_invalid_integer() {
        assert!(matches!(
            decode(&["test", "abc"], Some("INTEGER")),
            Err(KeyDecodeError::InvalidInteger { .. })
        ));
        assert!(matches!(
            decode(&["test", "99999999999999999999"], Some("INTEGER")),
            Err(KeyDecodeError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_bytes_accepts_padded_and_unpadded() {
        let a = decode(&["test", "AQI"], Some("BYTES")).unwrap();
        let b = decode(&["test", "AQI="], Some("BYTES")).unwrap();
        assert_eq!(a.user_key, UserKey::Bytes(vec![1, 2]));
        assert_eq!(a, b);
        assert!(matches!(
            decode(&["test", "*notb64*"], Some("BYTES")),
            Err(KeyDecodeError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_digest_length_checked() {
        let ok = BASE64URL.encode([9u8; DIGEST_LEN]);
        assert!(decode(&["test", &ok], Some("DIGEST")).is_ok());
        let short = BASE64URL.encode([9u8; 19]);
        assert!(matches!(
            decode(&["test", &short], Some("DIGEST")),
            Err(KeyDecodeError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_unsupported_keytype() {
        assert!(matches!(
            decode(&["test", "k"], Some("FLOAT")),
            Err(KeyDecodeError::UnsupportedKeyType { .. })
        ));
    }

    #[test]
    fn test_bad_path_shapes() {
        assert!(matches!(decode(&["test"], None), Err(KeyDecodeError::InvalidPath { .. })));
        assert!(matches!(
            decode(&["a", "b", "c", "d"], None),
            Err(KeyDecodeError::InvalidPath { .. })
        ));
        assert!(matches!(decode(&["test", ""], None), Err(KeyDecodeError::InvalidPath { .. })));
    }

    fn arb_user_key() -> impl Strategy<Value = UserKey> {
        prop_oneof![
            "[a-zA-Z0-9_.-]{1,24}".prop_map(UserKey::String),
            any::<i64>().prop_map(UserKey::Integer),
            prop::collection::vec(any::<u8>(), 1..48).prop_map(UserKey::Bytes),
            any::<[u8; DIGEST_LEN]>().prop_map(|b| UserKey::Digest(Digest::new(b))),
        ]
    }

    fn arb_address() -> impl Strategy<Value = Address> {
        (
            "[a-z][a-z0-9]{0,15}",
            prop::option::of("[a-z][a-z0-9_]{0,15}"),
            arb_user_key(),
        )
            .prop_map(|(ns, set, key)| Address::new(ns, set.as_deref(), key))
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(address in arb_address()) {
            let (segments, key_type) = encode(&address);
            let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
            let decoded = decode(&refs, Some(key_type.as_str())).unwrap();
            prop_assert_eq!(decoded, address);
        }
    }
}
