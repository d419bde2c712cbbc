use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::machine::{ConversationState, ConversationSummary};
use crate::screening::session::{SaveStatus, Session, SessionHandle};
use crate::state::AppState;
use crate::storage::CandidateStore;

const MAX_MESSAGE_CHARS: usize = 5000;

const SAVE_FAILED_NOTICE: &str = "Your screening is complete, but we couldn't save your \
    information just now. Your answers are kept for this session; please try saving again.";

#[derive(Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub state: ConversationState,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub state: ConversationState,
    /// Present only on the turn that ended the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Serialize)]
pub struct SessionSummaryResponse {
    #[serde(flatten)]
    pub summary: ConversationSummary,
    pub save_status: SaveStatus,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub session_id: Uuid,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// POST /api/v1/sessions
pub async fn handle_start_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<StartSessionResponse>) {
    let (session_id, handle) = state.sessions.create().await;
    let turn = handle.lock().await.conversation.start();
    (
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            reply: turn.reply,
            state: turn.state,
        }),
    )
}

/// POST /api/v1/sessions/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let handle = find_session(&state, session_id).await?;
    let mut session = handle.lock().await;

    let turn = session
        .conversation
        .handle_message(&req.message, state.llm.as_ref())
        .await;

    let (saved, notice) = if turn.handoff.is_some() {
        let (saved, notice) = persist(state.store.as_ref(), &mut session).await;
        (Some(saved), notice)
    } else {
        (None, None)
    };

    Ok(Json(MessageResponse {
        session_id,
        reply: turn.reply,
        state: turn.state,
        saved,
        notice,
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummaryResponse>, AppError> {
    let handle = find_session(&state, session_id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionSummaryResponse {
        summary: session.conversation.summary(),
        save_status: session.save_status.clone(),
    }))
}

/// POST /api/v1/sessions/:id/save
///
/// Retries persistence for an ended session. Saving again after success is a no-op upsert.
pub async fn handle_save_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    let handle = find_session(&state, session_id).await?;
    let mut session = handle.lock().await;

    if !session.conversation.state().is_terminal() {
        return Err(AppError::Conflict(format!(
            "session {session_id} has not ended yet"
        )));
    }

    let (saved, notice) = persist(state.store.as_ref(), &mut session).await;
    Ok(Json(SaveResponse {
        session_id,
        saved,
        notice,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&session_id).await {
        info!("Session {session_id} discarded");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(session_id))
    }
}

async fn find_session(state: &AppState, session_id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))
}

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("session {session_id} not found"))
}

/// Saves the session's profile. Failures become a candidate-facing notice, never an HTTP error.
async fn persist(store: &dyn CandidateStore, session: &mut Session) -> (bool, Option<String>) {
    session
        .conversation
        .profile_mut()
        .mark_persisted(Utc::now());
    let profile = session.conversation.profile().clone();

    match store.save(&profile).await {
        Ok(()) => {
            session.save_status = SaveStatus::Saved;
            (true, None)
        }
        Err(e) => {
            warn!(
                "Saving candidate {} to {} failed: {e}",
                profile.session_id(),
                store.backend_name()
            );
            session.save_status = SaveStatus::Failed {
                error: e.to_string(),
            };
            (false, Some(SAVE_FAILED_NOTICE.to_string()))
        }
    }
}
