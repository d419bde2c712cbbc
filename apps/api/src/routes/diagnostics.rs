use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use crate::llm_client::{prompts::screening_system, GenerationOptions};
use crate::state::AppState;

const PING_PROMPT: &str = "Reply with the single word: ok";
const PING_MAX_TOKENS: u32 = 10;

#[derive(Serialize)]
pub struct DiagnosticsResponse {
    pub healthy: bool,
    pub llm: LlmCheck,
    pub config: ConfigCheck,
    pub storage: StorageCheck,
    pub active_sessions: usize,
}

#[derive(Serialize)]
pub struct LlmCheck {
    pub reachable: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ConfigCheck {
    pub valid: bool,
    pub problems: Vec<String>,
}

#[derive(Serialize)]
pub struct StorageCheck {
    pub backend: &'static str,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/v1/diagnostics
/// Pings the LLM with a tiny request and reports config and storage health.
pub async fn diagnostics_handler(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let options = GenerationOptions {
        max_tokens: PING_MAX_TOKENS,
        ..state.config.generation_options()
    };
    let system = screening_system(&state.config.company_name);
    let llm = match state.llm.generate(&system, PING_PROMPT, &options).await {
        Ok(_) => LlmCheck {
            reachable: true,
            model: options.model.clone(),
            error: None,
        },
        Err(e) => {
            warn!("Diagnostics: LLM ping failed: {e}");
            LlmCheck {
                reachable: false,
                model: options.model.clone(),
                error: Some(e.to_string()),
            }
        }
    };

    let problems = state.config.validate();
    let config = ConfigCheck {
        valid: problems.is_empty(),
        problems,
    };

    let storage = match state.store.list().await {
        Ok(candidates) => StorageCheck {
            backend: state.store.backend_name(),
            reachable: true,
            candidate_count: Some(candidates.len()),
            error: None,
        },
        Err(e) => StorageCheck {
            backend: state.store.backend_name(),
            reachable: false,
            candidate_count: None,
            error: Some(e.to_string()),
        },
    };

    Json(DiagnosticsResponse {
        healthy: llm.reachable && config.valid && storage.reachable,
        llm,
        config,
        storage,
        active_sessions: state.sessions.len().await,
    })
}
