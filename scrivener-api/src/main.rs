//! Scrivener API Server Entry Point
//!
//! Bootstraps configuration, opens the prompt store, builds the OpenAI
//! completion provider and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use scrivener_api::constants::{DEFAULT_BIND_HOST, DEFAULT_PORT};
use scrivener_api::telemetry::{init_tracer, TelemetryConfig};
use scrivener_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, GenerationSettings, LlmConfig,
    StorageConfig,
};
use scrivener_core::ScrivenerError;
use scrivener_llm::{CompletionProvider, OpenAIClient, OpenAICompletionProvider};
use scrivener_storage::{LmdbPromptBackend, PromptStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let llm_config = LlmConfig::from_env().map_err(ScrivenerError::from)?;
    let storage_config = StorageConfig::from_env().map_err(ScrivenerError::from)?;
    let api_config = ApiConfig::from_env();

    let store = Arc::new(open_store(&storage_config).await?);
    tracing::info!(backend = store.backend_name(), "Prompt store ready");

    let provider = build_provider(&llm_config);
    tracing::info!(
        provider = provider.provider_id(),
        model = provider.model_id(),
        "Completion provider ready"
    );

    let state = AppState::new(store, provider, GenerationSettings::from(&llm_config));
    let app: Router = create_api_router(state, &api_config, &telemetry_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Scrivener API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

async fn open_store(config: &StorageConfig) -> ApiResult<PromptStore> {
    let store = match config {
        StorageConfig::Memory => PromptStore::in_memory().await?,
        StorageConfig::Lmdb { path, max_size_mb } => {
            let backend =
                LmdbPromptBackend::open(path, *max_size_mb).map_err(ScrivenerError::from)?;
            PromptStore::open(Arc::new(backend)).await?
        }
    };
    Ok(store)
}

fn build_provider(config: &LlmConfig) -> Arc<dyn CompletionProvider> {
    let mut client = OpenAIClient::new(config.api_key.clone(), config.requests_per_minute);
    if let Some(base_url) = &config.base_url {
        client = client.with_base_url(base_url.clone());
    }
    Arc::new(OpenAICompletionProvider::new(client, config.model.clone()))
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host =
        std::env::var("SCRIVENER_API_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("SCRIVENER_API_PORT").ok())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
