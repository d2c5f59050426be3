//! Record addressing.
//!
//! An [`Address`] names exactly one record: a namespace, an optional set and
//! a user key. The user key is typed; which variant is populated is chosen
//! by the caller's key type indicator. `String`, `Integer` and `Bytes` keys
//! are hashed into a [`Digest`] by the store client. A `Digest` key addresses
//! the record directly.

use std::fmt;

/// Width in bytes of a record digest.
pub const DIGEST_LEN: usize = 20;

/// Fixed-width record identifier derived by the store from set + user key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }

    /// Build a digest from a slice, returning `None` unless the slice is
    /// exactly [`DIGEST_LEN`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; DIGEST_LEN] = bytes.try_into().ok()?;
        Some(Digest(array))
    }

    /// Borrow the digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// How a user key token is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    /// Token is the key verbatim
    #[default]
    String,
    /// Token is a base-10 signed integer
    Integer,
    /// Token is Base64url-encoded bytes
    Bytes,
    /// Token is a Base64url-encoded digest
    Digest,
}

impl KeyType {
    /// Every supported key type.
    pub const ALL: [KeyType; 4] = [
        KeyType::String,
        KeyType::Integer,
        KeyType::Bytes,
        KeyType::Digest,
    ];

    /// Wire name of the key type (the `keytype` query parameter value).
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "STRING",
            KeyType::Integer => "INTEGER",
            KeyType::Bytes => "BYTES",
            KeyType::Digest => "DIGEST",
        }
    }

    /// Parse a wire name, ignoring ASCII case.
    pub fn parse(s: &str) -> Option<KeyType> {
        KeyType::ALL
            .into_iter()
            .find(|kt| kt.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed user key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserKey {
    /// String key
    String(String),
    /// Integer key
    Integer(i64),
    /// Blob key
    Bytes(Vec<u8>),
    /// Pre-computed digest
    Digest(Digest),
}

impl UserKey {
    /// The key type that produces this variant.
    pub fn key_type(&self) -> KeyType {
        match self {
            UserKey::String(_) => KeyType::String,
            UserKey::Integer(_) => KeyType::Integer,
            UserKey::Bytes(_) => KeyType::Bytes,
            UserKey::Digest(_) => KeyType::Digest,
        }
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::String(s) => write!(f, "{}", s),
            UserKey::Integer(i) => write!(f, "{}", i),
            UserKey::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            UserKey::Digest(d) => write!(f, "digest:{}", d),
        }
    }
}

/// Fully qualified record address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Namespace name
    pub namespace: String,
    /// Set name; `None` is the null set, distinct from any named set
    pub set: Option<String>,
    /// Typed user key
    pub user_key: UserKey,
}

impl Address {
    /// Create an address.
    pub fn new(namespace: impl Into<String>, set: Option<&str>, user_key: UserKey) -> Self {
        Address {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            user_key,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.set {
            Some(set) => write!(f, "{}/{}/{}", self.namespace, set, self.user_key),
            None => write!(f, "{}/{}", self.namespace, self.user_key),
        }
    }
}
