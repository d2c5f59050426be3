//! Value types for Recordgate
//!
//! ## Canonical Value Model
//!
//! The Value enum has exactly 9 variants:
//! - Null, Bool, Int, Float, String, Blob, List, Map, GeoJson
//!
//! ### Type Rules
//!
//! - No implicit type coercions
//! - `Int(1) != Float(1.0)` - different types are NEVER equal
//! - `Blob` is not `String`, `GeoJson` is not `String`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//!
//! ## Wire Representation
//!
//! A single serde implementation serves both wire formats. Self-describing
//! text formats (JSON) get tagged one-entry maps for the values JSON cannot
//! carry; compact binary formats (MessagePack) carry blobs and floats natively.
//!
//! | Value | JSON | MessagePack |
//! |-------|------|-------------|
//! | Blob | `{"$bytes": "<base64>"}` | `bin` |
//! | NaN / ±Inf / -0.0 | `{"$f64": "NaN"}` etc. | `float 64` |
//! | GeoJson | `{"$geojson": "<text>"}` | `{"$geojson": "<text>"}` |
//!
//! Deserialization accepts both spellings from either format, so a request
//! decoded from JSON and from MessagePack yields the same `Value`.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const BYTES_TAG: &str = "$bytes";
const FLOAT_TAG: &str = "$f64";
const GEOJSON_TAG: &str = "$geojson";

/// Canonical bin value.
///
/// Map keys are strings and iterate in sorted order, which keeps encoded
/// output deterministic across both wire formats.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value (also used to delete a bin on write)
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Blob(Vec<u8>),
    /// Ordered list of values
    List(Vec<Value>),
    /// Map with string keys
    Map(BTreeMap<String, Value>),
    /// GeoJSON document text
    GeoJson(String),
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Blob(_) => "Blob",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::GeoJson(_) => "GeoJson",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Blob value
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &[Value] if this is a List value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as &BTreeMap if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Blob(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

// ============================================================================
// Serde
// ============================================================================

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => {
                if serializer.is_human_readable() {
                    if let Some(tag) = special_float_to_str(*f) {
                        return serialize_tagged(serializer, FLOAT_TAG, tag);
                    }
                }
                serializer.serialize_f64(*f)
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Blob(b) => {
                if serializer.is_human_readable() {
                    serialize_tagged(serializer, BYTES_TAG, &BASE64.encode(b))
                } else {
                    serializer.serialize_bytes(b)
                }
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::GeoJson(text) => serialize_tagged(serializer, GEOJSON_TAG, text),
        }
    }
}

fn serialize_tagged<S>(serializer: S, tag: &str, body: &str) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(tag, body)?;
    map.end()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bin value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {} does not fit in 64-bit signed range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Blob(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Blob(v))
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = access.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            entries.insert(key, value);
        }
        untag(entries).map_err(de::Error::custom)
    }
}

/// Recognize the one-entry tagged maps; anything else stays a plain map.
fn untag(entries: BTreeMap<String, Value>) -> Result<Value, String> {
    let tagged = match entries.iter().next() {
        Some((tag, Value::String(body))) if entries.len() == 1 => Some((tag.clone(), body.clone())),
        _ => None,
    };

    match tagged.as_ref().map(|(t, b)| (t.as_str(), b.as_str())) {
        Some((BYTES_TAG, body)) => BASE64
            .decode(body)
            .map(Value::Blob)
            .map_err(|e| format!("invalid base64 in {}: {}", BYTES_TAG, e)),
        Some((FLOAT_TAG, body)) => special_float_from_str(body).map(Value::Float),
        Some((GEOJSON_TAG, body)) => Ok(Value::GeoJson(body.to_string())),
        _ => Ok(Value::Map(entries)),
    }
}

fn special_float_to_str(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("NaN")
    } else if f.is_infinite() {
        Some(if f.is_sign_positive() { "+Inf" } else { "-Inf" })
    } else if f == 0.0 && f.is_sign_negative() {
        Some("-0.0")
    } else {
        None
    }
}

fn special_float_from_str(s: &str) -> Result<f64, String> {
    match s {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        "-0.0" => Ok(-0.0),
        other => other
            .parse::<f64>()
            .map_err(|_| format!("invalid {} value: {}", FLOAT_TAG, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> Value {
        let mut inner = BTreeMap::new();
        inner.insert("count".to_string(), Value::Int(i64::MAX));
        inner.insert("ratio".to_string(), Value::Float(0.25));
        inner.insert("raw".to_string(), Value::Blob(vec![0, 1, 2, 255]));
        inner.insert(
            "tags".to_string(),
            Value::List(vec![Value::from("a"), Value::Null, Value::Bool(true)]),
        );
        inner.insert(
            "where".to_string(),
            Value::GeoJson(r#"{"type":"Point","coordinates":[1.5,2.5]}"#.to_string()),
        );
        Value::Map(inner)
    }

    #[test]
    fn test_type_equality_is_strict() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Blob(b"abc".to_vec()), Value::String("abc".into()));
        assert_ne!(Value::GeoJson("{}".into()), Value::String("{}".into()));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn test_json_uses_tagged_blob() {
        let json = serde_json::to_string(&Value::Blob(vec![1, 2, 3])).unwrap();
        assert_eq!(json, r#"{"$bytes":"AQID"}"#);
    }

    #[test]
    fn test_json_preserves_i64_extremes() {
        for i in [i64::MIN, -1, 0, i64::MAX] {
            let json = serde_json::to_string(&Value::Int(i)).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, Value::Int(i));
        }
    }

    #[test]
    fn test_json_keeps_whole_floats_as_floats() {
        let json = serde_json::to_string(&Value::Float(3.0)).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Float(3.0));
    }

    #[test]
    fn test_json_special_floats() {
        let json = serde_json::to_string(&Value::Float(f64::INFINITY)).unwrap();
        assert_eq!(json, r#"{"$f64":"+Inf"}"#);
        let back: Value = serde_json::from_str(r#"{"$f64":"NaN"}"#).unwrap();
        assert!(back.as_float().unwrap().is_nan());
        let back: Value = serde_json::from_str(r#"{"$f64":"-0.0"}"#).unwrap();
        assert!(back.as_float().unwrap().is_sign_negative());
    }

    #[test]
    fn test_json_rejects_out_of_range_unsigned() {
        let result: Result<Value, _> = serde_json::from_str("18446744073709551615");
        assert!(result.is_err());
    }

    #[test]
    fn test_msgpack_carries_blob_as_bin() {
        let bytes = rmp_serde::to_vec(&Value::Blob(vec![9, 8, 7])).unwrap();
        // bin8 marker, length 3
        assert_eq!(bytes[0], 0xc4);
        assert_eq!(bytes[1], 3);
        let back: Value = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, Value::Blob(vec![9, 8, 7]));
    }

    #[test]
    fn test_both_formats_decode_to_same_value() {
        let original = sample_map();
        let from_json: Value =
            serde_json::from_slice(&serde_json::to_vec(&original).unwrap()).unwrap();
        let from_msgpack: Value =
            rmp_serde::from_slice(&rmp_serde::to_vec(&original).unwrap()).unwrap();
        assert_eq!(from_json, original);
        assert_eq!(from_msgpack, original);
    }

    #[test]
    fn test_tagged_map_with_extra_keys_is_plain_map() {
        let back: Value = serde_json::from_str(r#"{"$bytes":"AQID","other":1}"#).unwrap();
        assert_eq!(back.as_map().map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_invalid_tagged_base64_is_error() {
        let result: Result<Value, _> = serde_json::from_str(r#"{"$bytes":"***"}"#);
        assert!(result.is_err());
    }
}
