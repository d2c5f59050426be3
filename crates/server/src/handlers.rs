//! HTTP route handlers.
//!
//! Each handler decodes its inputs, runs the gateway call on the blocking
//! pool, and encodes the outcome through [`Negotiated`]. Errors are rendered
//! in the negotiated response format.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recordgate_core::Bins;
use recordgate_executor::{Error, Gateway};

use crate::error::status_for;
use crate::negotiate::Negotiated;
use crate::request::{ExecuteParams, OpsBody, RecordParams, RecordPath, ScanParams};
use crate::response::{ClusterBody, InfoBody, RecordBody, ScanBody, TaskBody};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Gateway every handler runs against
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// Wrap a gateway.
    pub fn new(gateway: Gateway) -> Self {
        AppState {
            gateway: Arc::new(gateway),
        }
    }

    /// Run a store-bound gateway call off the async workers.
    async fn run<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Gateway) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        tokio::task::spawn_blocking(move || f(&gateway))
            .await
            .map_err(|e| Error::Internal {
                reason: format!("request worker failed: {}", e),
            })?
    }
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

// ============================================================================
// /v1/kvs
// ============================================================================

/// Handle GET /v1/kvs/{ns}[/{set}]/{key}
pub async fn get_record(
    State(state): State<AppState>,
    neg: Negotiated,
    path: RecordPath,
    Query(params): Query<RecordParams>,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let filter = params.filter()?;
        let bins = params.bins();
        let record = state
            .run(move |gw| gw.get_record(&address, filter, bins))
            .await?;
        neg.reply(StatusCode::OK, &RecordBody::from(record))
    }
    .await;
    neg.respond(result)
}

/// Handle HEAD /v1/kvs/{ns}[/{set}]/{key}
///
/// Answers with a bare status in every case.
pub async fn head_record(
    State(state): State<AppState>,
    path: RecordPath,
    Query(params): Query<RecordParams>,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let filter = params.filter()?;
        state
            .run(move |gw| gw.record_exists(&address, filter))
            .await
    }
    .await;
    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::debug!(target: "recordgate::http", error = %e, "HEAD miss");
            status_for(&e).into_response()
        }
    }
}

/// Handle POST /v1/kvs/{ns}[/{set}]/{key}
pub async fn create_record(
    State(state): State<AppState>,
    neg: Negotiated,
    path: RecordPath,
    Query(params): Query<RecordParams>,
    body: Bytes,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let ttl = params.ttl()?;
        let bins: Bins = neg.decode(&body)?;
        state
            .run(move |gw| gw.create_record(&address, &bins, ttl))
            .await?;
        Ok::<_, Error>(StatusCode::CREATED.into_response())
    }
    .await;
    neg.respond(result)
}

/// Handle PUT /v1/kvs/{ns}[/{set}]/{key}
pub async fn replace_record(
    State(state): State<AppState>,
    neg: Negotiated,
    path: RecordPath,
    Query(params): Query<RecordParams>,
    body: Bytes,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let write = params.write_params()?;
        let bins: Bins = neg.decode(&body)?;
        state
            .run(move |gw| gw.replace_record(&address, &bins, write))
            .await?;
        Ok::<_, Error>(no_content())
    }
    .await;
    neg.respond(result)
}

/// Handle PATCH /v1/kvs/{ns}[/{set}]/{key}
pub async fn update_record(
    State(state): State<AppState>,
    neg: Negotiated,
    path: RecordPath,
    Query(params): Query<RecordParams>,
    body: Bytes,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let write = params.write_params()?;
        let bins: Bins = neg.decode(&body)?;
        state
            .run(move |gw| gw.update_record(&address, &bins, write))
            .await?;
        Ok::<_, Error>(no_content())
    }
    .await;
    neg.respond(result)
}

/// Handle DELETE /v1/kvs/{ns}[/{set}]/{key}
pub async fn delete_record(
    State(state): State<AppState>,
    neg: Negotiated,
    path: RecordPath,
    Query(params): Query<RecordParams>,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let generation = params.write_params()?.generation;
        state
            .run(move |gw| gw.delete_record(&address, generation))
            .await?;
        Ok::<_, Error>(no_content())
    }
    .await;
    neg.respond(result)
}

// ============================================================================
// /v1/operate
// ============================================================================

/// Handle POST /v1/operate/{ns}[/{set}]/{key}
pub async fn operate(
    State(state): State<AppState>,
    neg: Negotiated,
    path: RecordPath,
    Query(params): Query<RecordParams>,
    body: Bytes,
) -> Response {
    let result = async {
        let address = params.address(&path)?;
        let write = params.write_params()?;
        let ops: OpsBody = neg.decode(&body)?;
        let record = state
            .run(move |gw| gw.operate(&address, &ops.ops_list, write))
            .await?;
        neg.reply(StatusCode::OK, &RecordBody::from(record))
    }
    .await;
    neg.respond(result)
}

// ============================================================================
// /v1/scan
// ============================================================================

/// Handle GET /v1/scan/{ns}
pub async fn scan_namespace(
    State(state): State<AppState>,
    neg: Negotiated,
    Path(namespace): Path<String>,
    Query(params): Query<ScanParams>,
) -> Response {
    neg.respond(scan(state, neg, &namespace, None, params).await)
}

/// Handle GET /v1/scan/{ns}/{set}
pub async fn scan_set(
    State(state): State<AppState>,
    neg: Negotiated,
    Path((namespace, set)): Path<(String, String)>,
    Query(params): Query<ScanParams>,
) -> Response {
    neg.respond(scan(state, neg, &namespace, Some(&set), params).await)
}

async fn scan(
    state: AppState,
    neg: Negotiated,
    namespace: &str,
    set: Option<&str>,
    params: ScanParams,
) -> Result<Response, Error> {
    let spec = params.spec(namespace, set)?;
    let max_records = params.max_records()?;
    let from = params.from_token().map(str::to_string);
    let page = state
        .run(move |gw| gw.scan(&spec, max_records, from.as_deref()))
        .await?;
    neg.reply(StatusCode::OK, &ScanBody::from(page))
}

// ============================================================================
// /v2/execute
// ============================================================================

/// Handle POST /v2/execute/scan/{ns}
pub async fn execute_namespace(
    State(state): State<AppState>,
    neg: Negotiated,
    Path(namespace): Path<String>,
    Query(params): Query<ExecuteParams>,
    body: Bytes,
) -> Response {
    neg.respond(execute(state, neg, &namespace, None, params, body).await)
}

/// Handle POST /v2/execute/scan/{ns}/{set}
pub async fn execute_set(
    State(state): State<AppState>,
    neg: Negotiated,
    Path((namespace, set)): Path<(String, String)>,
    Query(params): Query<ExecuteParams>,
    body: Bytes,
) -> Response {
    neg.respond(execute(state, neg, &namespace, Some(&set), params, body).await)
}

async fn execute(
    state: AppState,
    neg: Negotiated,
    namespace: &str,
    set: Option<&str>,
    params: ExecuteParams,
    body: Bytes,
) -> Result<Response, Error> {
    let spec = params.spec(namespace, set)?;
    let ops: OpsBody = neg.decode(&body)?;
    let task = state
        .run(move |gw| gw.submit_execute(&spec, ops.ops_list))
        .await?;
    neg.reply(StatusCode::ACCEPTED, &TaskBody::from(task))
}

/// Handle GET /v2/execute/scan/status/{task_id}
pub async fn execute_status(
    State(state): State<AppState>,
    neg: Negotiated,
    Path(task_id): Path<String>,
) -> Response {
    // A pure registry read; no store call, so no blocking hop.
    let result = state
        .gateway
        .task_status(&task_id)
        .and_then(|task| neg.reply(StatusCode::OK, &TaskBody::from(task)));
    neg.respond(result)
}

// ============================================================================
// /v1/info, /v1/cluster
// ============================================================================

/// Handle POST /v1/info
pub async fn info_any(State(state): State<AppState>, neg: Negotiated, body: Bytes) -> Response {
    neg.respond(info(state, neg, None, body).await)
}

/// Handle POST /v1/info/{node}
pub async fn info_node(
    State(state): State<AppState>,
    neg: Negotiated,
    Path(node): Path<String>,
    body: Bytes,
) -> Response {
    neg.respond(info(state, neg, Some(node), body).await)
}

async fn info(
    state: AppState,
    neg: Negotiated,
    node: Option<String>,
    body: Bytes,
) -> Result<Response, Error> {
    let commands: Vec<String> = neg.decode(&body)?;
    let response = state
        .run(move |gw| gw.info(node.as_deref(), &commands))
        .await?;
    let body: InfoBody = response.responses;
    neg.reply(StatusCode::OK, &body)
}

/// Handle GET /v1/cluster
pub async fn cluster(State(state): State<AppState>, neg: Negotiated) -> Response {
    let result = async {
        let nodes = state.run(|gw| gw.nodes()).await?;
        neg.reply(StatusCode::OK, &ClusterBody { nodes })
    }
    .await;
    neg.respond(result)
}
