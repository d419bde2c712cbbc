//! Field validation: pure shape checks for every intake field.
//!
//! Every check runs on sanitized input (markup/quote characters stripped, trimmed).
//! A field only counts as filled once `validate` returns `ok`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::screening::profile::CandidateField;

/// Upper bound on a plausible career length.
const MAX_EXPERIENCE_YEARS: f64 = 50.0;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@(?:[A-Za-z0-9\-]+\.)+[A-Za-z]{2,}$").expect("valid regex")
});

static PHONE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9 +\-()]+$").expect("valid regex"));

static YEARS_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<n>\d+(?:\.\d+)?)\s*(?P<plus>\+)?\s*(?:years?|yrs?)?(?:\s+of\s+experience)?$",
    )
    .expect("valid regex")
});

static YEARS_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<lo>\d+(?:\.\d+)?)\s*(?:-|–|to)\s*(?P<hi>\d+(?:\.\d+)?)\s*(?:years?|yrs?)?(?:\s+of\s+experience)?$",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub normalized_value: Option<String>,
    pub error_message: Option<String>,
}

impl ValidationResult {
    fn pass(value: impl Into<String>) -> Self {
        Self {
            ok: true,
            normalized_value: Some(value.into()),
            error_message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            normalized_value: None,
            error_message: Some(message.into()),
        }
    }
}

/// Strips characters that have no business in a profile field and trims.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validates and normalizes `raw` as a value for `field`.
pub fn validate(field: CandidateField, raw: &str) -> ValidationResult {
    let value = sanitize(raw);
    if value.is_empty() {
        return ValidationResult::fail(format!("Please provide your {}.", field.label()));
    }

    match field {
        CandidateField::Email => validate_email(&value),
        CandidateField::Phone => validate_phone(&value),
        CandidateField::ExperienceYears => validate_experience_years(&value),
        // Free text: any non-empty value is accepted as typed.
        CandidateField::FullName
        | CandidateField::DesiredPosition
        | CandidateField::Location
        | CandidateField::TechStack => ValidationResult::pass(value),
    }
}

fn validate_email(value: &str) -> ValidationResult {
    if EMAIL_RE.is_match(value) {
        ValidationResult::pass(value.to_lowercase())
    } else {
        ValidationResult::fail("Please provide a valid email address (e.g., name@example.com).")
    }
}

fn validate_phone(value: &str) -> ValidationResult {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_CHARS_RE.is_match(value) || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return ValidationResult::fail(format!(
            "Please provide a valid phone number ({MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits; \
             spaces, '+', '-', and parentheses are fine)."
        ));
    }
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    ValidationResult::pass(normalized)
}

fn validate_experience_years(value: &str) -> ValidationResult {
    match normalize_experience(value) {
        Some(canonical) => ValidationResult::pass(canonical),
        None => ValidationResult::fail(format!(
            "Please provide your years of experience as a number between 0 and {} \
             (e.g., 3, 5.5, 2-3, or 5+).",
            MAX_EXPERIENCE_YEARS as u32
        )),
    }
}

/// Canonical experience string: `"3"`, `"2.5"`, `"2-3"`, or `"5+"`.
pub fn normalize_experience(value: &str) -> Option<String> {
    let lowered = value.trim().to_lowercase();

    if let Some(caps) = YEARS_RANGE_RE.captures(&lowered) {
        let lo = parse_years(&caps["lo"])?;
        let hi = parse_years(&caps["hi"])?;
        if lo > hi {
            return None;
        }
        return Some(format!("{}-{}", format_years(lo), format_years(hi)));
    }

    let caps = YEARS_SINGLE_RE.captures(&lowered)?;
    let years = parse_years(&caps["n"])?;
    if caps.name("plus").is_some() {
        Some(format!("{}+", format_years(years)))
    } else {
        Some(format_years(years))
    }
}

/// Lower bound of a canonical experience string, used for seniority banding.
pub fn experience_lower_bound(canonical: &str) -> Option<f64> {
    let head = canonical
        .split(['-', '+'])
        .next()
        .unwrap_or(canonical)
        .trim();
    head.parse::<f64>().ok()
}

fn parse_years(raw: &str) -> Option<f64> {
    let years: f64 = raw.parse().ok()?;
    (0.0..=MAX_EXPERIENCE_YEARS).contains(&years).then_some(years)
}

fn format_years(years: f64) -> String {
    if years.fract() == 0.0 {
        format!("{}", years as u32)
    } else {
        format!("{years}")
    }
}
