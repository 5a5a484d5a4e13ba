// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::dataset_source::{DatasetSource, FallbackSource};
use crate::application::history_store::{BlobStore, HistoryStore};
use crate::application::session::SessionManager;
use crate::infrastructure::blob_store::{FileBlobStore, MemoryBlobStore};
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::local_source::LocalSource;
use crate::infrastructure::remote_source::RemoteSource;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Local storage (infrastructure layer)
    let blobs: Arc<dyn BlobStore> = match &config.storage.dir {
        Some(dir) => Arc::new(FileBlobStore::new(dir.clone())),
        None => Arc::new(MemoryBlobStore::new()),
    };
    let history = HistoryStore::new(blobs, config.storage.key.clone(), config.storage.capacity);
    let local: Arc<dyn DatasetSource> = Arc::new(LocalSource::new(history));

    // Pick the dataset source once; remote degrades to local on failure
    let source: Arc<dyn DatasetSource> = match &config.remote.base_url {
        Some(base_url) => {
            let remote = RemoteSource::new(
                base_url.clone(),
                config.remote.timeout(),
                config.storage.capacity,
            )
            .context("Failed to build remote client")?;
            tracing::info!("Using remote dataset API at {}", base_url);
            Arc::new(FallbackSource::new(Arc::new(remote), local))
        }
        None => {
            tracing::info!("No remote API configured, running offline");
            local
        }
    };

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;

    let state = Arc::new(AppState {
        sessions: SessionManager::new(source, config),
    });
    let router = build_router(state);

    // Start server
    tracing::info!("Starting equipment-telemetry service on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
