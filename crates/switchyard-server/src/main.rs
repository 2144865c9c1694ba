use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use switchyard_core::NodeRegistry;
use switchyard_downstream::Connector;
use switchyard_server::app_state::AppState;
use switchyard_server::config::ServerConfig;
use switchyard_server::gateway::Gateway;
use switchyard_server::session::SessionManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;

    let registry = NodeRegistry::load(&config.nodes_file)
        .with_context(|| format!("failed to load nodes from {}", config.nodes_file.display()))?;
    let connector = Connector::new(config.upstream_timeout)?;

    let state = AppState {
        gateway: Arc::new(Gateway::new(Arc::new(registry), Arc::new(connector))),
        sessions: Arc::new(SessionManager::new()),
    };

    let app = switchyard_server::router::create_router(state);

    let addr = config.bind_addr();
    tracing::info!("Switchyard gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("server error")
}
