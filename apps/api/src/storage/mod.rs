//! Candidate persistence. The screening flow only sees `CandidateStore`;
//! `main` picks the backend at startup.

use async_trait::async_trait;
use thiserror::Error;

use crate::screening::profile::CandidateProfile;

pub mod export;
pub mod handlers;
pub mod json_file;
pub mod postgres;

pub use json_file::JsonFileStore;
pub use postgres::PgCandidateStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Inserts or replaces the record for `profile.session_id()`.
    async fn save(&self, profile: &CandidateProfile) -> Result<(), StorageError>;

    /// All stored candidates, newest first.
    async fn list(&self) -> Result<Vec<CandidateProfile>, StorageError>;

    /// Most recent record with this email, compared case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<CandidateProfile>, StorageError> {
        let wanted = email.trim().to_lowercase();
        Ok(self.list().await?.into_iter().find(|p| {
            p.email
                .as_deref()
                .is_some_and(|e| e.to_lowercase() == wanted)
        }))
    }

    fn backend_name(&self) -> &'static str;
}

/// Newest first; records without a timestamp sort last.
pub(crate) fn sort_newest_first(profiles: &mut [CandidateProfile]) {
    profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
