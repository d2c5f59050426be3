//! `recordgate` binary: an HTTP gateway over an in-process record store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use recordgate_server::{build_cli, CliArgs, GatewayConfig, GatewayServer, CONFIG_FILE_NAME};
use recordgate_store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    let args = CliArgs::from_matches(&matches);

    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    GatewayConfig::write_default_if_missing(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut config = GatewayConfig::from_file(&path)?;
    config.apply_cli(&args);
    config.validate()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();
    tracing::info!(
        config = %path.display(),
        namespaces = ?config.store.namespaces,
        nodes = ?config.store.nodes,
        "Starting recordgate"
    );

    let store = MemoryStore::new(config.store.clone());
    let server = GatewayServer::new(Arc::new(store), config)?;
    server.run().await
}
