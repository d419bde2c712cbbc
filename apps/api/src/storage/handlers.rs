use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::screening::profile::CandidateProfile;
use crate::state::AppState;
use crate::storage::export::{compute_stats, to_csv, CandidateStats};

#[derive(Deserialize)]
pub struct CandidateQuery {
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct CandidateListResponse {
    pub backend: &'static str,
    pub candidates: Vec<CandidateProfile>,
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<CandidateQuery>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let candidates = match params.email.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(email) => state
            .store
            .find_by_email(email)
            .await?
            .into_iter()
            .collect(),
        None => state.store.list().await?,
    };
    Ok(Json(CandidateListResponse {
        backend: state.store.backend_name(),
        candidates,
    }))
}

/// GET /api/v1/candidates/stats
pub async fn handle_candidate_stats(
    State(state): State<AppState>,
) -> Result<Json<CandidateStats>, AppError> {
    let candidates = state.store.list().await?;
    Ok(Json(compute_stats(&candidates, state.store.backend_name())))
}

/// GET /api/v1/candidates/export
pub async fn handle_export_candidates(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let candidates = state.store.list().await?;
    let body = to_csv(&candidates).map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"candidates.csv\"",
            ),
        ],
        body,
    ))
}
