use crate::config::{env_lookup, StoreBackend, TripgenConfig};
use crate::http::{create_router, AppState};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tripgen_core::*;

/// Open the configured trip store.
pub fn build_store(config: &TripgenConfig) -> anyhow::Result<Arc<dyn TripStore>> {
    let store: Arc<dyn TripStore> = match config.store.backend {
        StoreBackend::Redb => {
            let path = config.db_path();
            info!("Opening database at {:?}", path);
            let store = RedbTripStore::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            info!("Database loaded: {} trips", store.count()?);
            Arc::new(store)
        }
        StoreBackend::Firestore => {
            let fs = config.firestore_config(env_lookup)?;
            info!(
                "Using Firestore project {} (collection {}) at {}",
                fs.project_id, fs.collection, fs.base_url
            );
            Arc::new(FirestoreTripStore::new(fs)?)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory trip store; records are lost on exit");
            Arc::new(MemoryTripStore::new())
        }
    };
    Ok(store)
}

/// Wire the generation client and store into a pipeline.
pub fn build_pipeline(config: &TripgenConfig) -> anyhow::Result<Pipeline> {
    let gemini = config.gemini_config(env_lookup)?;
    info!("Generation model: {} ({:?} timeout)", gemini.model, gemini.timeout);
    let generator = Arc::new(GeminiClient::new(gemini)?);
    let store = build_store(config)?;
    Ok(Pipeline::new(generator, store).with_options(config.pipeline_options()))
}

pub async fn run(config: TripgenConfig) -> anyhow::Result<()> {
    info!("Starting tripgen server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.server.http_addr);
    info!("Data: {:?}", config.server.data_dir);

    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
    }

    let pipeline = build_pipeline(&config)?;
    if pipeline.options().record_failures {
        info!("Failed generations will mark trips FAILED");
    }

    let state = AppState {
        pipeline,
        start_time: std::time::Instant::now(),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", config.server.http_addr))?;
    info!("HTTP server listening on {}", config.server.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, terminating...");
}
