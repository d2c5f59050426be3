//! Pagination completeness.

use std::collections::HashSet;

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use recordgate::{Error, Gateway, ScanConfig, ScanSpec};

use crate::common::*;

/// Chain pages from no token until the cursor is exhausted.
fn drain(gw: &Gateway, spec: &ScanSpec, page_size: usize) -> (Vec<usize>, Vec<i64>) {
    let mut sizes = Vec::new();
    let mut keys = Vec::new();
    let mut from: Option<String> = None;
    loop {
        let page = gw.scan(spec, Some(page_size), from.as_deref()).unwrap();
        sizes.push(page.records.len());
        for record in &page.records {
            keys.push(record.bins["integer"].as_int().unwrap());
        }
        match page.cursor.next_token {
            Some(token) => from = Some(token),
            None => break,
        }
        assert!(sizes.len() <= 10_000, "pagination does not terminate");
    }
    (sizes, keys)
}

#[test]
fn n101_p10_gives_11_pages() {
    let (store, gw) = gateway();
    seed(&store, 0..101);

    let (sizes, keys) = drain(&gw, &ScanSpec::new(NS, Some(SET)), 10);

    assert_eq!(sizes.len(), 11);
    assert_eq!(sizes[10], 1);
    assert!(sizes[..10].iter().all(|&s| s == 10));
    let distinct: HashSet<i64> = keys.iter().copied().collect();
    assert_eq!(keys.len(), 101);
    assert_eq!(distinct, (0..101).collect());
}

#[test]
fn exact_multiple_has_no_empty_trailing_page() {
    let (store, gw) = gateway();
    seed(&store, 0..30);

    let (sizes, keys) = drain(&gw, &ScanSpec::new(NS, Some(SET)), 10);

    assert_eq!(sizes, vec![10, 10, 10]);
    assert_eq!(keys.len(), 30);
}

#[test]
fn empty_set_is_one_empty_page() {
    let (_, gw) = gateway();
    let page = gw.scan(&ScanSpec::new(NS, Some(SET)), Some(10), None).unwrap();
    assert!(page.records.is_empty());
    assert!(page.cursor.is_exhausted());
}

#[test]
fn random_insert_order_and_page_size() {
    let mut rng = rand::thread_rng();
    let mut keys: Vec<i64> = (0..200).collect();
    keys.shuffle(&mut rng);
    let page_size = rng.gen_range(1..=37);

    let (store, gw) = gateway();
    seed(&store, keys.iter().copied());

    let (sizes, seen) = drain(&gw, &ScanSpec::new(NS, Some(SET)), page_size);
    assert_eq!(sizes.len(), 200usize.div_ceil(page_size), "page size {}", page_size);
    let distinct: HashSet<i64> = seen.iter().copied().collect();
    assert_eq!(seen.len(), 200);
    assert_eq!(distinct.len(), 200);
}

#[test]
fn tokens_are_url_safe() {
    let (store, gw) = gateway();
    seed(&store, 0..5);
    let page = gw.scan(&ScanSpec::new(NS, Some(SET)), Some(2), None).unwrap();
    let token = page.cursor.next_token.unwrap();
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn page_size_limits_are_client_errors() {
    let scan = ScanConfig {
        default_max_records: 5,
        max_records_limit: 50,
    };
    let (store, gw) = gateway_with(scan, fast_tasks());
    seed(&store, 0..20);
    let spec = ScanSpec::new(NS, Some(SET));

    assert_eq!(gw.scan(&spec, None, None).unwrap().records.len(), 5);
    for bad in [0, 51] {
        let err = gw.scan(&spec, Some(bad), None).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }), "{}", bad);
    }
}

#[test]
fn failure_mid_scan_is_an_error_not_the_end() {
    let (store, gw) = gateway();
    seed(&store, 0..20);
    let spec = ScanSpec::new(NS, Some(SET));

    let first = gw.scan(&spec, Some(10), None).unwrap();
    let token = first.cursor.next_token.unwrap();

    store.set_node_available("node-1", false);
    let err = gw.scan(&spec, Some(10), Some(&token)).unwrap_err();
    assert!(matches!(err, Error::ScanIncomplete { .. }));

    store.set_node_available("node-1", true);
    let rest = gw.scan(&spec, Some(10), Some(&token)).unwrap();
    assert_eq!(rest.records.len(), 10);
    assert!(rest.cursor.is_exhausted());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_record_exactly_once(n in 0i64..80, page_size in 1usize..16) {
        let (store, gw) = gateway();
        seed(&store, 0..n);

        let (sizes, keys) = drain(&gw, &ScanSpec::new(NS, Some(SET)), page_size);

        let expected_pages = (n as usize).div_ceil(page_size).max(1);
        prop_assert_eq!(sizes.len(), expected_pages);
        let distinct: HashSet<i64> = keys.iter().copied().collect();
        prop_assert_eq!(keys.len(), n as usize);
        prop_assert_eq!(distinct.len(), n as usize);
    }
}
