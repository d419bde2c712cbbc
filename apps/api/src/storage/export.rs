//! Reporting over stored candidates: CSV export and summary statistics.

use std::collections::HashMap;

use serde::Serialize;

use crate::screening::profile::{CandidateField, CandidateProfile};
use crate::screening::validation::experience_lower_bound;

const TOP_N: usize = 10;

/// One CSV row per candidate; question/answer columns widen to the longest interview.
pub fn to_csv(profiles: &[CandidateProfile]) -> Result<String, csv::Error> {
    let max_questions = profiles
        .iter()
        .map(|p| p.technical_questions.len())
        .max()
        .unwrap_or(0);

    let mut header: Vec<String> = CandidateField::ORDER
        .iter()
        .map(|f| f.key().to_string())
        .collect();
    header.push("created_at".to_string());
    header.push("session_id".to_string());
    for i in 1..=max_questions {
        header.push(format!("question_{i}"));
        header.push(format!("answer_{i}"));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;

    for profile in profiles {
        let mut record: Vec<String> = CandidateField::ORDER
            .iter()
            .map(|f| profile.get(*f).unwrap_or_default().to_string())
            .collect();
        record.push(
            profile
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        );
        record.push(profile.session_id().to_string());
        for i in 0..max_questions {
            record.push(profile.technical_questions.get(i).cloned().unwrap_or_default());
            record.push(profile.technical_answers.get(i).cloned().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExperienceDistribution {
    pub junior: usize,
    pub mid_level: usize,
    pub senior: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStats {
    pub total_candidates: usize,
    pub storage_backend: String,
    pub popular_positions: Vec<CountEntry>,
    pub popular_technologies: Vec<CountEntry>,
    pub experience_distribution: ExperienceDistribution,
}

pub fn compute_stats(profiles: &[CandidateProfile], backend: &str) -> CandidateStats {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut technologies: HashMap<String, usize> = HashMap::new();
    let mut experience = ExperienceDistribution::default();

    for profile in profiles {
        if let Some(position) = profile.get(CandidateField::DesiredPosition) {
            *positions.entry(position.trim().to_string()).or_default() += 1;
        }

        if let Some(stack) = profile.get(CandidateField::TechStack) {
            for tech in stack
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(|t| t.trim().to_lowercase())
                .filter(|t| t.chars().count() > 2)
            {
                *technologies.entry(tech).or_default() += 1;
            }
        }

        match profile
            .get(CandidateField::ExperienceYears)
            .and_then(experience_lower_bound)
        {
            Some(years) if years < 2.0 => experience.junior += 1,
            Some(years) if years < 5.0 => experience.mid_level += 1,
            Some(_) => experience.senior += 1,
            None => experience.unknown += 1,
        }
    }

    CandidateStats {
        total_candidates: profiles.len(),
        storage_backend: backend.to_string(),
        popular_positions: top_n(positions),
        popular_technologies: top_n(technologies),
        experience_distribution: experience,
    }
}

/// Highest counts first, ties broken alphabetically.
fn top_n(counts: HashMap<String, usize>) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(name, count)| CountEntry { name, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(TOP_N);
    entries
}
