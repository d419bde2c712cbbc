mod config;
mod db;
mod errors;
mod llm_client;
mod routes;
mod screening;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::prompts::PromptBuilder;
use crate::screening::session::SessionRegistry;
use crate::state::AppState;
use crate::storage::{CandidateStore, JsonFileStore, PgCandidateStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // Initialize candidate storage
    let store = build_store(&config).await;
    info!("Candidate storage: {}", store.backend_name());

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout);
    info!(
        "LLM client initialized (model: {}, max_tokens: {}, temperature: {})",
        config.model_name, config.max_tokens, config.temperature
    );

    // Build app state
    let sessions = SessionRegistry::new(
        PromptBuilder::new(config.company_name.clone()),
        config.generation_options(),
    );
    let state = AppState {
        llm: Arc::new(llm),
        store,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set and reachable, otherwise the local JSON file.
async fn build_store(config: &Config) -> Arc<dyn CandidateStore> {
    if let Some(database_url) = &config.database_url {
        match create_pool(database_url).await {
            Ok(pool) => return Arc::new(PgCandidateStore::new(pool)),
            Err(e) => warn!(
                "PostgreSQL unavailable ({e}); falling back to {}",
                config.data_storage_path.display()
            ),
        }
    }
    let store = JsonFileStore::new(config.data_storage_path.clone());
    info!("Storing candidates in {}", store.path().display());
    Arc::new(store)
}
