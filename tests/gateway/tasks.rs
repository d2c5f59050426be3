//! Execute task lifecycle.

use std::sync::Arc;
use std::thread;

use recordgate::{Error, Operation, ScanSpec, StoreClient, TaskStatus, Value};
use recordgate_store::ReadOptions;

use crate::common::*;

fn flag_ops() -> Vec<Operation> {
    vec![Operation::Put {
        bin: "flag".into(),
        value: Value::Bool(true),
    }]
}

#[test]
fn status_after_complete_is_stable() {
    let (store, gw) = gateway();
    seed(&store, 0..50);

    let task = gw
        .submit_execute(&ScanSpec::new(NS, Some(SET)), flag_ops())
        .unwrap();
    assert_eq!(task.status, TaskStatus::Running);

    let id = task.id.to_string();
    let done = wait_terminal(&gw, &id);
    assert_eq!(done.status, TaskStatus::Complete);
    assert_eq!(done.records, Some(50));

    for _ in 0..20 {
        let again = gw.task_status(&id).unwrap();
        assert_eq!(again.status, TaskStatus::Complete);
        assert_eq!(again.finished_at, done.finished_at);
    }

    let record = store.get(&addr(7), &ReadOptions::default()).unwrap();
    assert_eq!(record.bins.get("flag"), Some(&Value::Bool(true)));
}

#[test]
fn running_until_store_reports() {
    let (store, gw) = gateway();
    seed(&store, 0..3);
    store.pause_jobs();

    let task = gw
        .submit_execute(&ScanSpec::new(NS, Some(SET)), flag_ops())
        .unwrap();
    let id = task.id.to_string();
    for _ in 0..10 {
        assert_eq!(gw.task_status(&id).unwrap().status, TaskStatus::Running);
        thread::sleep(std::time::Duration::from_millis(5));
    }

    store.resume_jobs();
    assert_eq!(wait_terminal(&gw, &id).status, TaskStatus::Complete);
}

#[test]
fn failed_job_is_error_and_stays_error() {
    let (store, gw) = gateway();
    seed(&store, 0..3);

    let ops = vec![Operation::Append {
        bin: "integer".into(),
        value: "x".into(),
    }];
    let task = gw.submit_execute(&ScanSpec::new(NS, Some(SET)), ops).unwrap();
    let id = task.id.to_string();

    let done = wait_terminal(&gw, &id);
    assert_eq!(done.status, TaskStatus::Error);
    assert!(done.error.is_some());
    for _ in 0..5 {
        assert_eq!(gw.task_status(&id).unwrap().status, TaskStatus::Error);
    }
}

#[test]
fn unknown_ids_are_not_found() {
    let (_, gw) = gateway();
    for id in [
        "00000000-0000-0000-0000-000000000000",
        "3b241101-e2bb-4255-8caf-4136c566a962",
        "",
        "nope",
    ] {
        let err = gw.task_status(id).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound { .. }), "{}", id);
    }
}

#[test]
fn invalid_submissions_are_client_errors() {
    let (_, gw) = gateway();
    let spec = ScanSpec::new(NS, Some(SET));

    let err = gw.submit_execute(&spec, vec![]).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));

    let err = gw
        .submit_execute(&spec, vec![Operation::Read { bin: "a".into() }])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));

    let err = gw
        .submit_execute(&ScanSpec::new("nope", None), flag_ops())
        .unwrap_err();
    assert!(matches!(err, Error::NamespaceNotFound { .. }));
    assert!(gw.tasks().is_empty());
}

#[test]
fn concurrent_submit_then_status_sees_task() {
    let (store, gw) = gateway();
    seed(&store, 0..5);
    store.pause_jobs();
    let gw = Arc::new(gw);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gw = Arc::clone(&gw);
            thread::spawn(move || {
                let mut ids = Vec::new();
                for _ in 0..10 {
                    let task = gw
                        .submit_execute(&ScanSpec::new(NS, Some(SET)), flag_ops())
                        .unwrap();
                    let id = task.id.to_string();
                    // No window in which a returned id is unknown.
                    assert!(gw.task_status(&id).is_ok());
                    ids.push(id);
                }
                ids
            })
        })
        .collect();

    let ids: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 80);

    store.resume_jobs();
    for id in &ids {
        assert_eq!(wait_terminal(&gw, id).status, TaskStatus::Complete);
    }
}
