//! Motor Workflow API Server
//!
//! # Usage
//!
//! ```bash
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin motor-workflow-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE_URL` - PostgreSQL connection string; without it documents
//!   are kept in memory
//! * `API_LOG_LEVEL` - Log level (default: info)
//! * `API_REGISTRY__ENVIRONMENT` - `sandbox` or `production`
//! * `API_REGISTRY__CLIENT_ID` / `API_REGISTRY__CLIENT_SECRET` - registry credentials

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::DocumentStore;
use domain_vehicle::RcRegistryAdapter;
use infra_store::{create_pool, run_migrations, DatabaseConfig, InMemoryDocumentStore, PostgresDocumentStore};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Motor Workflow API Server"
    );

    let store = create_store(&config).await?;

    let registry_config = config.registry.adapter_config();
    if !registry_config.has_credentials() {
        tracing::warn!("RC registry credentials are not configured; verification will fail");
    }
    let registry = Arc::new(RcRegistryAdapter::new(registry_config)?);

    let app = create_router(AppState::new(store, registry, config.clone()));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("Invalid server address")?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn create_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(DatabaseConfig::new(url.clone()))
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PostgresDocumentStore::new(pool)))
        }
        None => {
            tracing::warn!("No database configured, documents are kept in memory");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
