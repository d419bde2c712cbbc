//! Candidate session record: the data accumulated over one screening conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven profile fields collected during intake, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateField {
    FullName,
    Email,
    Phone,
    ExperienceYears,
    DesiredPosition,
    Location,
    TechStack,
}

impl CandidateField {
    /// Fixed collection order. `Collecting(i)` refers to `ORDER[i]`.
    pub const ORDER: [CandidateField; 7] = [
        CandidateField::FullName,
        CandidateField::Email,
        CandidateField::Phone,
        CandidateField::ExperienceYears,
        CandidateField::DesiredPosition,
        CandidateField::Location,
        CandidateField::TechStack,
    ];

    pub fn at(index: usize) -> Option<CandidateField> {
        Self::ORDER.get(index).copied()
    }

    pub fn key(&self) -> &'static str {
        match self {
            CandidateField::FullName => "full_name",
            CandidateField::Email => "email",
            CandidateField::Phone => "phone",
            CandidateField::ExperienceYears => "experience_years",
            CandidateField::DesiredPosition => "desired_position",
            CandidateField::Location => "location",
            CandidateField::TechStack => "tech_stack",
        }
    }

    /// Human-readable label used in prompts and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            CandidateField::FullName => "full name",
            CandidateField::Email => "email address",
            CandidateField::Phone => "phone number",
            CandidateField::ExperienceYears => "years of experience",
            CandidateField::DesiredPosition => "desired position",
            CandidateField::Location => "current location",
            CandidateField::TechStack => "tech stack",
        }
    }
}

impl std::fmt::Display for CandidateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Everything the screening conversation learns about one candidate.
///
/// Profile fields stay `None` until a validated value is stored.
/// `session_id` is fixed at construction; `created_at` is stamped by the first
/// persistence attempt and reused by retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience_years: Option<String>,
    pub desired_position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Option<String>,
    #[serde(default)]
    pub technical_questions: Vec<String>,
    #[serde(default)]
    pub technical_answers: Vec<String>,
    session_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

impl CandidateProfile {
    pub fn new() -> Self {
        Self::with_session_id(Uuid::new_v4())
    }

    pub fn with_session_id(session_id: Uuid) -> Self {
        Self {
            full_name: None,
            email: None,
            phone: None,
            experience_years: None,
            desired_position: None,
            location: None,
            tech_stack: None,
            technical_questions: Vec::new(),
            technical_answers: Vec::new(),
            session_id,
            created_at: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn get(&self, field: CandidateField) -> Option<&str> {
        let value = match field {
            CandidateField::FullName => &self.full_name,
            CandidateField::Email => &self.email,
            CandidateField::Phone => &self.phone,
            CandidateField::ExperienceYears => &self.experience_years,
            CandidateField::DesiredPosition => &self.desired_position,
            CandidateField::Location => &self.location,
            CandidateField::TechStack => &self.tech_stack,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// Stores an already-validated value. Callers go through the validator first.
    pub(crate) fn set(&mut self, field: CandidateField, value: String) {
        let slot = match field {
            CandidateField::FullName => &mut self.full_name,
            CandidateField::Email => &mut self.email,
            CandidateField::Phone => &mut self.phone,
            CandidateField::ExperienceYears => &mut self.experience_years,
            CandidateField::DesiredPosition => &mut self.desired_position,
            CandidateField::Location => &mut self.location,
            CandidateField::TechStack => &mut self.tech_stack,
        };
        *slot = Some(value);
    }

    pub fn filled_count(&self) -> usize {
        CandidateField::ORDER
            .iter()
            .filter(|f| self.get(**f).is_some())
            .count()
    }

    /// First name for a friendlier tone in prompts.
    pub fn first_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
    }

    /// Stamps `created_at` if this is the first persistence attempt.
    pub fn mark_persisted(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.created_at.get_or_insert(now)
    }
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_is_fixed() {
        let keys: Vec<_> = CandidateField::ORDER.iter().map(|f| f.key()).collect();
        assert_eq!(
            keys,
            vec![
                "full_name",
                "email",
                "phone",
                "experience_years",
                "desired_position",
                "location",
                "tech_stack"
            ]
        );
        assert!(CandidateField::at(7).is_none());
    }

    #[test]
    fn test_field_serde_matches_key() {
        for field in CandidateField::ORDER {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }

    #[test]
    fn test_new_profile_is_empty_with_session_id() {
        let p = CandidateProfile::new();
        assert_eq!(p.filled_count(), 0);
        assert!(p.technical_questions.is_empty());
        assert!(p.created_at.is_none());
        assert_ne!(p.session_id(), CandidateProfile::new().session_id());
    }

    #[test]
    fn test_set_and_get() {
        let mut p = CandidateProfile::new();
        p.set(CandidateField::Email, "jane@x.com".to_string());
        assert_eq!(p.get(CandidateField::Email), Some("jane@x.com"));
        assert_eq!(p.filled_count(), 1);
    }

    #[test]
    fn test_first_name() {
        let mut p = CandidateProfile::new();
        assert!(p.first_name().is_none());
        p.set(CandidateField::FullName, "Jane Doe".to_string());
        assert_eq!(p.first_name(), Some("Jane"));
    }

    #[test]
    fn test_mark_persisted_only_stamps_once() {
        let mut p = CandidateProfile::new();
        let first = p.mark_persisted(Utc::now());
        let later = first + chrono::Duration::seconds(30);
        assert_eq!(p.mark_persisted(later), first);
        assert_eq!(p.created_at, Some(first));
    }

    #[test]
    fn test_profile_json_roundtrip_keeps_session_id() {
        let mut p = CandidateProfile::new();
        p.set(CandidateField::FullName, "Jane Doe".to_string());
        p.technical_questions.push("Q1".to_string());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["session_id"], serde_json::json!(p.session_id()));
        let back: CandidateProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
