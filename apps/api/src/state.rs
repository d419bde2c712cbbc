use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::screening::session::SessionRegistry;
use crate::storage::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Production: `LlmClient`. Tests swap in canned generators.
    pub llm: Arc<dyn TextGenerator>,
    /// JSON file or PostgreSQL, chosen at startup.
    pub store: Arc<dyn CandidateStore>,
    pub sessions: SessionRegistry,
    pub config: Config,
}
