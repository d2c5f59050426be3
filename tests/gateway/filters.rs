//! Filter selectivity.

use recordgate::codec::filter;
use recordgate::{Error, Expression, Operation, ScanSpec, StoreClient, TaskStatus, Value};
use recordgate_store::ReadOptions;

use crate::common::*;

fn gt1() -> Expression {
    Expression::gt(Expression::int_bin("integer"), Expression::int(1))
}

fn le1() -> Expression {
    Expression::le(Expression::int_bin("integer"), Expression::int(1))
}

/// Round-trip through the URL token, as a request would carry it.
fn via_token(expr: &Expression) -> Expression {
    filter::decode(&filter::encode(expr).unwrap()).unwrap()
}

#[test]
fn record_returned_or_not_found() {
    let (store, gw) = gateway();
    seed(&store, [10]);

    let record = gw.get_record(&addr(10), Some(via_token(&gt1())), None).unwrap();
    assert_eq!(record.bins["integer"], Value::Int(10));

    assert_eq!(
        gw.get_record(&addr(10), Some(via_token(&le1())), None),
        Err(Error::RecordNotFound)
    );
    // Indistinguishable from a missing record.
    assert_eq!(
        gw.get_record(&addr(11), Some(via_token(&gt1())), None),
        Err(Error::RecordNotFound)
    );
    assert!(gw.record_exists(&addr(10), Some(gt1())).is_ok());
    assert_eq!(
        gw.record_exists(&addr(10), Some(le1())),
        Err(Error::RecordNotFound)
    );
}

#[test]
fn mismatched_types_do_not_match() {
    let (store, gw) = gateway();
    seed(&store, [10]);
    let expr = Expression::eq(Expression::string_bin("integer"), Expression::string("10"));
    assert_eq!(
        gw.get_record(&addr(10), Some(expr), None),
        Err(Error::RecordNotFound)
    );
}

#[test]
fn scan_returns_only_matching_records() {
    let (store, gw) = gateway();
    seed(&store, 0..10);

    let spec = ScanSpec::new(NS, Some(SET)).with_filter(Some(Expression::ge(
        Expression::int_bin("integer"),
        Expression::int(7),
    )));
    let page = gw.scan(&spec, Some(100), None).unwrap();
    let mut keys: Vec<i64> = page
        .records
        .iter()
        .map(|r| r.bins["integer"].as_int().unwrap())
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![7, 8, 9]);
}

#[test]
fn execute_applies_only_to_matching_records() {
    let (store, gw) = gateway();
    seed(&store, 0..10);

    let spec = ScanSpec::new(NS, Some(SET)).with_filter(Some(via_token(&le1())));
    let ops = vec![Operation::Add {
        bin: "integer".into(),
        incr: Value::Int(100),
    }];
    let task = gw.submit_execute(&spec, ops).unwrap();
    let done = wait_terminal(&gw, &task.id.to_string());
    assert_eq!(done.status, TaskStatus::Complete);
    assert_eq!(done.records, Some(2));

    let read = |k| {
        store
            .get(&addr(k), &ReadOptions::default())
            .unwrap()
            .bins["integer"]
            .clone()
    };
    assert_eq!(read(0), Value::Int(100));
    assert_eq!(read(1), Value::Int(101));
    assert_eq!(read(2), Value::Int(2));
}

#[test]
fn bad_tokens_are_client_errors() {
    for token in ["!!!", "AAAA", ""] {
        let err: Error = filter::decode(token).unwrap_err().into();
        assert!(matches!(err, Error::InvalidFilter { .. }), "{:?}", token);
    }
}
