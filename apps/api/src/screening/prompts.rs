//! Prompt Builder: every text the screener shows the candidate or sends to the LLM.
//!
//! Pure templating: no network, no storage. Templates use `{name}` placeholders
//! that are replaced before the text leaves this module.

use crate::screening::profile::{CandidateField, CandidateProfile};
use crate::screening::validation::experience_lower_bound;

pub const DEFAULT_COMPANY_NAME: &str = "TalentScout";

/// Static reply once a conversation has reached its terminal state.
pub const SESSION_ENDED_MESSAGE: &str = "This screening session has already ended. \
    Thank you again for your time! Start a new session if you'd like to go through it again.";

/// What the candidate is currently being asked for, used to aim the fallback prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTarget {
    Field(CandidateField),
    Question { index: usize, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Greeting,
    RequestField(CandidateField),
    GenerateQuestions,
    Fallback(FallbackTarget),
    Closing,
}

const GREETING_TEMPLATE: &str = "Hello! Welcome to {company_name}. I'm your hiring assistant, \
    and I'll guide you through our initial screening.\n\n\
    I'll collect a few details about you and then ask some technical questions based on \
    your experience and skills. You can type 'bye' at any time to finish early.";

const FALLBACK_TEMPLATE: &str =
    "I'm sorry, I didn't quite catch that. Could you rephrase? {target}";

/// Question generation instruction. Replace: {desired_position}, {tech_stack},
/// {experience_years}, {experience_level}
const GENERATE_QUESTIONS_TEMPLATE: &str = r#"Generate between 3 and 5 technical interview questions for this candidate.

CANDIDATE PROFILE:
- Desired Position: {desired_position}
- Technology Stack: {tech_stack}
- Years of Experience: {experience_years} ({experience_level})

Instructions:
- Use the exact technologies the candidate listed: {tech_stack}
- Make every question relevant to the "{desired_position}" role
- Match the difficulty to a {experience_level} candidate
- Prefer practical, scenario-based questions over definitions
- Frontend roles: component architecture, state management, performance
- Backend roles: API design, databases, scalability
- Data/ML roles: data processing, model evaluation
- DevOps/Cloud roles: deployment, infrastructure, monitoring

OUTPUT FORMAT:
Return 3 to 5 questions, exactly one question per line.
Do NOT number the questions. Do NOT add headings, blank commentary, or any other text."#;

const CLOSING_TEMPLATE: &str = "Thank you so much for your time, {full_name}. \
    We appreciate you sharing your background with {company_name} today.\n\n\
    We've noted {experience_phrase} with {tech_stack}, your interest in {position_phrase}, \
    and that you're based in {location}.\n\n\
    Your information has been recorded, and a {company_name} recruiter will be in touch \
    within 2-3 business days to discuss next steps. We look forward to connecting with you!";

/// Instruction for an LLM-written sign-off. Replace: {full_name}, {tech_stack},
/// {experience_phrase}, {position_phrase}, {location}, {company_name}
const CLOSING_INSTRUCTION_TEMPLATE: &str = r#"Write a short, warm, professional closing message for a candidate who just finished a screening conversation with {company_name}.

Candidate details:
- Name: {full_name}
- Tech stack: {tech_stack}
- Experience: {experience_phrase}
- Desired position: {position_phrase}
- Location: {location}

The message MUST:
1. Thank the candidate using the exact name "{full_name}"
2. Mention the exact tech stack text "{tech_stack}"
3. Reference the desired position
4. Say a {company_name} recruiter will follow up within 2-3 business days

Return only the message text, no headings or placeholders."#;

/// Builds prompts for one conversation. Cheap to clone; holds only branding.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    company_name: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_COMPANY_NAME)
    }
}

impl PromptBuilder {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn build(&self, kind: PromptKind, profile: &CandidateProfile) -> String {
        match kind {
            PromptKind::Greeting => {
                fill(GREETING_TEMPLATE, &[("company_name", self.company_name.as_str())])
            }
            PromptKind::RequestField(field) => request_field(field, profile),
            PromptKind::GenerateQuestions => generate_questions(profile),
            PromptKind::Fallback(target) => {
                let target_text = match target {
                    FallbackTarget::Field(field) => request_field(field, profile),
                    FallbackTarget::Question { index, total } => {
                        let question = profile
                            .technical_questions
                            .get(index)
                            .map(String::as_str)
                            .unwrap_or_default();
                        question_line(index, total, question)
                    }
                };
                FALLBACK_TEMPLATE.replace("{target}", &target_text)
            }
            PromptKind::Closing => self.fill_closing(CLOSING_TEMPLATE, profile),
        }
    }

    /// Instruction asking the LLM for a personalized sign-off.
    pub fn closing_instruction(&self, profile: &CandidateProfile) -> String {
        self.fill_closing(CLOSING_INSTRUCTION_TEMPLATE, profile)
    }

    fn fill_closing(&self, template: &str, profile: &CandidateProfile) -> String {
        let parts = ClosingParts::from_profile(profile);
        fill(
            template,
            &[
                ("company_name", self.company_name.as_str()),
                ("full_name", parts.full_name),
                ("tech_stack", parts.tech_stack),
                ("experience_phrase", parts.experience_phrase.as_str()),
                ("position_phrase", parts.position_phrase.as_str()),
                ("location", parts.location),
            ],
        )
    }
}

/// Closing substitutions, with neutral phrasing for fields an early exit left empty.
struct ClosingParts<'a> {
    full_name: &'a str,
    tech_stack: &'a str,
    experience_phrase: String,
    position_phrase: String,
    location: &'a str,
}

impl<'a> ClosingParts<'a> {
    fn from_profile(profile: &'a CandidateProfile) -> Self {
        let experience_phrase = match profile.get(CandidateField::ExperienceYears) {
            Some(years) => format!("your {years} years of experience"),
            None => "your professional experience".to_string(),
        };
        let position_phrase = match profile.get(CandidateField::DesiredPosition) {
            Some(position) => format!("the {position} role"),
            None => "the positions you're interested in".to_string(),
        };
        Self {
            full_name: profile.get(CandidateField::FullName).unwrap_or("there"),
            tech_stack: profile
                .get(CandidateField::TechStack)
                .unwrap_or("your technical skills"),
            experience_phrase,
            position_phrase,
            location: profile
                .get(CandidateField::Location)
                .unwrap_or("your area"),
        }
    }
}

fn request_field(field: CandidateField, profile: &CandidateProfile) -> String {
    let question = match field {
        CandidateField::FullName => "What's your full name? (e.g., John Smith)",
        CandidateField::Email => "What's your email address? (e.g., john.smith@email.com)",
        CandidateField::Phone => {
            "What's your phone number? (e.g., 555-123-4567 or +1 (555) 123-4567)"
        }
        CandidateField::ExperienceYears => {
            "How many years of professional experience do you have? \
             (e.g., 3, 5.5, 2-3, or 0 for entry level)"
        }
        CandidateField::DesiredPosition => {
            "What position are you interested in? Please be specific about the role and \
             technology focus. (e.g., 'Senior Backend Engineer - Python')"
        }
        CandidateField::Location => {
            "What's your current location? (e.g., San Francisco, CA or Remote)"
        }
        CandidateField::TechStack => {
            "Please list your technical skills: programming languages, frameworks, databases, \
             and tools you're proficient with. (e.g., 'Python, Django, PostgreSQL, Docker, AWS')"
        }
    };

    match (field, profile.first_name()) {
        (CandidateField::FullName, _) | (_, None) => question.to_string(),
        (_, Some(name)) => format!("{name}, {}", lowercase_first(question)),
    }
}

fn generate_questions(profile: &CandidateProfile) -> String {
    let experience = profile
        .get(CandidateField::ExperienceYears)
        .unwrap_or("unknown");
    fill(
        GENERATE_QUESTIONS_TEMPLATE,
        &[
            (
                "desired_position",
                profile
                    .get(CandidateField::DesiredPosition)
                    .unwrap_or("software engineer"),
            ),
            (
                "tech_stack",
                profile.get(CandidateField::TechStack).unwrap_or("general"),
            ),
            ("experience_years", experience),
            (
                "experience_level",
                ExperienceLevel::from_canonical(experience).label(),
            ),
        ],
    )
}

/// Single-pass `{name}` substitution. Inserted values are never rescanned, so
/// braces typed by the candidate survive verbatim. Unknown names are left as-is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Seniority band derived from the canonical experience string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Junior,
    MidLevel,
    Senior,
}

impl ExperienceLevel {
    pub fn from_canonical(experience: &str) -> Self {
        match experience_lower_bound(experience) {
            Some(years) if years <= 2.0 => ExperienceLevel::Junior,
            Some(years) if years <= 5.0 => ExperienceLevel::MidLevel,
            Some(_) => ExperienceLevel::Senior,
            None => ExperienceLevel::MidLevel,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior (0-2 years)",
            ExperienceLevel::MidLevel => "mid-level (3-5 years)",
            ExperienceLevel::Senior => "senior (6+ years)",
        }
    }
}

/// Short confirmation after a field is accepted.
pub fn field_acknowledgement(field: CandidateField, value: &str) -> String {
    match field {
        CandidateField::FullName => format!("Nice to meet you, {value}!"),
        CandidateField::Email => "Great! I've recorded your email address.".to_string(),
        CandidateField::Phone => "Thank you for providing your phone number.".to_string(),
        CandidateField::ExperienceYears => format!("Got it! {value} years of experience."),
        CandidateField::DesiredPosition => format!("Excellent! Looking for {value} positions."),
        CandidateField::Location => format!("Perfect! Located in {value}."),
        CandidateField::TechStack => "Excellent! I've recorded your technical skills.".to_string(),
    }
}

pub fn question_line(index: usize, total: usize, question: &str) -> String {
    format!("**Question {} of {}:** {}", index + 1, total, question)
}

/// Transition text into the technical round, carrying the first question.
pub fn questions_intro(profile: &CandidateProfile, total: usize) -> String {
    let position = profile
        .get(CandidateField::DesiredPosition)
        .unwrap_or("your desired");
    let tech_stack = profile
        .get(CandidateField::TechStack)
        .unwrap_or("your stack");
    let first = profile
        .technical_questions
        .first()
        .map(String::as_str)
        .unwrap_or_default();
    format!(
        "Perfect, I have all your information. Now I'll ask you {total} technical questions \
         tailored to a {position} role, focusing on your experience with {tech_stack}.\n\n{}\n\n\
         Please take your time and include specific examples from your experience.",
        question_line(0, total, first)
    )
}

pub fn next_question(index: usize, total: usize, question: &str) -> String {
    format!(
        "Thank you for that answer!\n\n{}\n\nPlease take your time to provide your response.",
        question_line(index, total, question)
    )
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> CandidateProfile {
        let mut p = CandidateProfile::new();
        p.set(CandidateField::FullName, "Jane Doe".to_string());
        p.set(CandidateField::Email, "jane@x.com".to_string());
        p.set(CandidateField::Phone, "555-1234".to_string());
        p.set(CandidateField::ExperienceYears, "3".to_string());
        p.set(CandidateField::DesiredPosition, "Backend Engineer".to_string());
        p.set(CandidateField::Location, "Austin, TX".to_string());
        p.set(CandidateField::TechStack, "Python, Go".to_string());
        p
    }

    #[test]
    fn test_greeting_names_company() {
        let b = PromptBuilder::new("Acme");
        let text = b.build(PromptKind::Greeting, &CandidateProfile::new());
        assert!(text.contains("Welcome to Acme"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_request_field_uses_first_name_once_known() {
        let b = PromptBuilder::default();
        let empty = CandidateProfile::new();
        let text = b.build(PromptKind::RequestField(CandidateField::Email), &empty);
        assert!(text.starts_with("What's your email"));

        let p = full_profile();
        let text = b.build(PromptKind::RequestField(CandidateField::Email), &p);
        assert!(text.starts_with("Jane, what's your email"));
    }

    #[test]
    fn test_generate_questions_embeds_profile_verbatim() {
        let text = PromptBuilder::default().build(PromptKind::GenerateQuestions, &full_profile());
        assert!(text.contains("Python, Go"));
        assert!(text.contains("Backend Engineer"));
        assert!(text.contains("Years of Experience: 3"));
        assert!(text.contains("one question per line"));
        assert!(text.contains("mid-level"));
    }

    #[test]
    fn test_fallback_references_current_field() {
        let text = PromptBuilder::default().build(
            PromptKind::Fallback(FallbackTarget::Field(CandidateField::Phone)),
            &CandidateProfile::new(),
        );
        assert!(text.contains("rephrase"));
        assert!(text.contains("phone number"));
    }

    #[test]
    fn test_fallback_references_current_question() {
        let mut p = full_profile();
        p.technical_questions = vec!["Q one?".into(), "Q two?".into()];
        let text = PromptBuilder::default().build(
            PromptKind::Fallback(FallbackTarget::Question { index: 1, total: 2 }),
            &p,
        );
        assert!(text.contains("**Question 2 of 2:** Q two?"));
    }

    #[test]
    fn test_closing_is_personalized() {
        let text = PromptBuilder::default().build(PromptKind::Closing, &full_profile());
        for expected in ["Jane Doe", "Python, Go", "Backend Engineer", "Austin, TX", "3 years"] {
            assert!(text.contains(expected), "closing missing {expected}");
        }
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_closing_without_fields_has_no_placeholders() {
        let text = PromptBuilder::default().build(PromptKind::Closing, &CandidateProfile::new());
        assert!(text.contains("Thank you so much for your time, there."));
        assert!(!text.contains('{'));
        assert!(!text.contains('}'));
    }

    #[test]
    fn test_closing_instruction_demands_literal_values() {
        let text = PromptBuilder::default().closing_instruction(&full_profile());
        assert!(text.contains("\"Jane Doe\""));
        assert!(text.contains("\"Python, Go\""));
    }

    #[test]
    fn test_placeholder_text_in_user_values_is_not_substituted() {
        let mut p = full_profile();
        p.set(CandidateField::FullName, "Jane {location}".to_string());
        p.set(CandidateField::DesiredPosition, "{tech_stack} Lead".to_string());

        let closing = PromptBuilder::default().build(PromptKind::Closing, &p);
        assert!(closing.contains("Thank you so much for your time, Jane {location}."));
        assert!(closing.contains("the {tech_stack} Lead role"));

        let generation = PromptBuilder::default().build(PromptKind::GenerateQuestions, &p);
        assert!(generation.contains("Desired Position: {tech_stack} Lead"));
        assert!(generation.contains("Technology Stack: Python, Go"));
    }

    #[test]
    fn test_fill_leaves_unknown_and_unclosed_braces() {
        assert_eq!(fill("a {x} {y} {", &[("x", "1")]), "a 1 {y} {");
    }

    #[test]
    fn test_experience_level_bands() {
        assert_eq!(ExperienceLevel::from_canonical("1"), ExperienceLevel::Junior);
        assert_eq!(ExperienceLevel::from_canonical("2-3"), ExperienceLevel::Junior);
        assert_eq!(ExperienceLevel::from_canonical("4"), ExperienceLevel::MidLevel);
        assert_eq!(ExperienceLevel::from_canonical("10+"), ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::from_canonical("unknown"), ExperienceLevel::MidLevel);
    }

    #[test]
    fn test_question_line_is_one_based() {
        assert_eq!(question_line(0, 3, "Why?"), "**Question 1 of 3:** Why?");
    }
}
