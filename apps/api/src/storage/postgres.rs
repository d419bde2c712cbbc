use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{CandidateStore, StorageError};
use crate::screening::profile::CandidateProfile;

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub session_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience_years: Option<String>,
    pub desired_position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Option<String>,
    pub technical_questions: Vec<String>,
    pub technical_answers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateProfile {
    fn from(row: CandidateRow) -> Self {
        let mut profile = CandidateProfile::with_session_id(row.session_id);
        profile.full_name = row.full_name;
        profile.email = row.email;
        profile.phone = row.phone;
        profile.experience_years = row.experience_years;
        profile.desired_position = row.desired_position;
        profile.location = row.location;
        profile.tech_stack = row.tech_stack;
        profile.technical_questions = row.technical_questions;
        profile.technical_answers = row.technical_answers;
        profile.created_at = Some(row.created_at);
        profile
    }
}

const SELECT_COLUMNS: &str = "session_id, full_name, email, phone, experience_years, \
    desired_position, location, tech_stack, technical_questions, technical_answers, created_at";

/// Candidate records in the `candidates` table, one row per session.
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn save(&self, profile: &CandidateProfile) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO candidates
                (session_id, full_name, email, phone, experience_years, desired_position,
                 location, tech_stack, technical_questions, technical_answers, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (session_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                experience_years = EXCLUDED.experience_years,
                desired_position = EXCLUDED.desired_position,
                location = EXCLUDED.location,
                tech_stack = EXCLUDED.tech_stack,
                technical_questions = EXCLUDED.technical_questions,
                technical_answers = EXCLUDED.technical_answers,
                updated_at = now()
            "#,
        )
        .bind(profile.session_id())
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.experience_years)
        .bind(&profile.desired_position)
        .bind(&profile.location)
        .bind(&profile.tech_stack)
        .bind(&profile.technical_questions)
        .bind(&profile.technical_answers)
        .bind(profile.created_at.unwrap_or_else(Utc::now))
        .execute(&self.pool)
        .await?;

        info!("Upserted candidate {} into PostgreSQL", profile.session_id());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CandidateProfile>, StorageError> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM candidates ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CandidateProfile::from).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CandidateProfile>, StorageError> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM candidates WHERE lower(email) = lower($1) \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CandidateProfile::from))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
