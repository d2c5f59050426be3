//! Key and payload codecs feeding the gateway.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use recordgate::codec::{key, WireCodec};
use recordgate::server::response::RecordBody;
use recordgate::{Bins, Error, KeyType, UserKey, Value};

use crate::common::*;

fn rich_bins() -> Bins {
    let mut nested = std::collections::BTreeMap::new();
    nested.insert("deep".to_string(), Value::List(vec![Value::Null, Value::Bool(false)]));
    [
        ("min", Value::Int(i64::MIN)),
        ("max", Value::Int(i64::MAX)),
        ("float", Value::Float(-0.5)),
        ("inf", Value::Float(f64::INFINITY)),
        ("text", Value::String("héllo".into())),
        ("blob", Value::Blob(vec![0, 159, 255])),
        ("map", Value::Map(nested)),
        ("geo", Value::GeoJson(r#"{"type":"Point","coordinates":[1,2]}"#.into())),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[test]
fn bytes_key_addresses_the_same_record_as_written() {
    let (_, gw) = gateway();
    let raw = vec![0u8, 1, 2, 250, 251];
    let token = URL_SAFE_NO_PAD.encode(&raw);

    let address = key::decode(&[NS, SET, &token], Some("BYTES")).unwrap();
    assert_eq!(address.user_key, UserKey::Bytes(raw));
    gw.create_record(&address, &int_bins("integer", 1), None).unwrap();

    let record = gw.get_record(&address, None, None).unwrap();
    let (segments, key_type) = key::encode(&record.address);
    assert_eq!(key_type, KeyType::Bytes);
    assert_eq!(segments, vec![NS.to_string(), SET.to_string(), token]);
}

#[test]
fn digest_key_reaches_record_written_by_integer_key() {
    let (store, gw) = gateway();
    seed(&store, [99]);

    let by_int = gw.get_record(&addr(99), None, None).unwrap();
    let token = URL_SAFE_NO_PAD.encode(by_int.digest.as_bytes());
    let address = key::decode(&[NS, SET, &token], Some("DIGEST")).unwrap();

    let by_digest = gw.get_record(&address, None, None).unwrap();
    assert_eq!(by_digest.bins, by_int.bins);
    assert_eq!(by_digest.digest, by_int.digest);
}

#[test]
fn key_errors_surface_as_invalid_key() {
    let cases: [(&[&str], Option<&str>); 4] = [
        (&[NS, SET, "12x"], Some("INTEGER")),
        (&[NS, SET, "***"], Some("BYTES")),
        (&[NS, SET, "AAAA"], Some("DIGEST")),
        (&[NS, SET, "k"], Some("UUID")),
    ];
    for (segments, keytype) in cases {
        let err: Error = key::decode(segments, keytype).unwrap_err().into();
        assert!(matches!(err, Error::InvalidKey { .. }), "{:?}", segments);
    }
}

#[test]
fn both_wire_formats_carry_the_same_record() {
    let (_, gw) = gateway();
    gw.create_record(&addr(1), &rich_bins(), Some(0)).unwrap();
    let body = RecordBody::from(gw.get_record(&addr(1), None, None).unwrap());

    let json = WireCodec::Json.encode(&body).unwrap();
    let msgpack = WireCodec::MessagePack.encode(&body).unwrap();

    let from_json: RecordBody = serde_json::from_slice(&json).unwrap();
    let from_msgpack: RecordBody = rmp_serde::from_slice(&msgpack).unwrap();
    assert_eq!(from_json, body);
    assert_eq!(from_msgpack, body);
    assert_eq!(from_json.bins, rich_bins());
}

#[test]
fn media_type_selection() {
    assert_eq!(
        WireCodec::from_content_type(Some("application/x-msgpack")).unwrap(),
        WireCodec::MessagePack
    );
    assert_eq!(
        WireCodec::from_accept(Some("*/*"), WireCodec::MessagePack).unwrap(),
        WireCodec::MessagePack
    );
    let err: Error = WireCodec::from_content_type(Some("application/xml"))
        .unwrap_err()
        .into();
    assert!(matches!(err, Error::UnsupportedMediaType { .. }));
}
