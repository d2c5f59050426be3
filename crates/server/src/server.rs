//! Router construction and the listener loop.

use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use recordgate_executor::Gateway;
use recordgate_store::StoreClient;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatewayConfig;
use crate::handlers::{self, AppState};
use crate::middleware::TracingLayer;

/// Build the gateway's router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/kvs/{*path}",
            get(handlers::get_record)
                .head(handlers::head_record)
                .post(handlers::create_record)
                .put(handlers::replace_record)
                .patch(handlers::update_record)
                .delete(handlers::delete_record),
        )
        .route("/v1/operate/{*path}", post(handlers::operate))
        .route("/v1/scan/{ns}", get(handlers::scan_namespace))
        .route("/v1/scan/{ns}/{set}", get(handlers::scan_set))
        // The static `status` segment wins over a namespace of that name.
        .route(
            "/v2/execute/scan/status/{task_id}",
            get(handlers::execute_status),
        )
        .route("/v2/execute/scan/{ns}", post(handlers::execute_namespace))
        .route("/v2/execute/scan/{ns}/{set}", post(handlers::execute_set))
        .route("/v1/info", post(handlers::info_any))
        .route("/v1/info/{node}", post(handlers::info_node))
        .route("/v1/cluster", get(handlers::cluster))
        .layer(TracingLayer::new())
        .with_state(state)
}

/// HTTP gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a server over `store`.
    pub fn new(store: Arc<dyn StoreClient>, config: GatewayConfig) -> anyhow::Result<Self> {
        let gateway = Gateway::new(store, config.scan.clone(), config.tasks.clone())
            .context("failed to create gateway")?;
        Ok(GatewayServer {
            config,
            state: AppState::new(gateway),
        })
    }

    /// The router this server serves.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C, then stop the task poller.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.server.bind)
            .await
            .with_context(|| format!("failed to bind {}", self.config.server.bind))?;
        info!(target: "recordgate::http", addr = %self.config.server.bind, "Gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!(target: "recordgate::http", "Gateway stopped");
        self.state.gateway.shutdown();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "recordgate::http", error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target: "recordgate::http", "Shutdown signal received");
}
