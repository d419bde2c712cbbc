//! Technical question handling: parsing LLM output and the offline question bank.

use std::sync::LazyLock;

use regex::Regex;

use crate::screening::profile::{CandidateField, CandidateProfile};
use crate::screening::prompts::ExperienceLevel;

pub const MIN_QUESTIONS: usize = 3;
pub const MAX_QUESTIONS: usize = 5;

/// Leading list markers: "1.", "2)", "Q3:", "Question 4 -", "-", "*", "•".
static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]+|(?:(?i:q(?:uestion)?)\s*)?\d+\s*[.):\-]?|(?i:q)\s*[.:])\s*")
        .expect("valid regex")
});

const KNOWN_TECHNOLOGIES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "c++",
    "c#",
    "react",
    "angular",
    "vue",
    "node.js",
    "django",
    "flask",
    "spring",
    "rust",
    "go",
    "sql",
    "mongodb",
];

/// Splits a raw LLM response into question strings, one per non-empty line.
///
/// List markers and markdown emphasis are stripped, preamble lines ending in ':'
/// are skipped, and duplicates are dropped. No cap is applied here.
pub fn parse_questions(raw: &str) -> Vec<String> {
    let mut questions: Vec<String> = Vec::new();
    for line in raw.lines() {
        let line = line.trim().replace("**", "");
        let stripped = LIST_MARKER_RE.replace(line.trim(), "");
        let question = stripped.trim();
        if question.is_empty() || question.ends_with(':') {
            continue;
        }
        if !questions.iter().any(|q| q.eq_ignore_ascii_case(question)) {
            questions.push(question.to_string());
        }
    }
    questions
}

/// Applies the 3..=5 bound: caps at five, pads from the fallback bank up to three.
pub fn bound_questions(mut questions: Vec<String>, profile: &CandidateProfile) -> Vec<String> {
    questions.truncate(MAX_QUESTIONS);
    if questions.len() < MIN_QUESTIONS {
        for candidate in fallback_questions(profile) {
            if questions.len() >= MIN_QUESTIONS {
                break;
            }
            if !questions.iter().any(|q| q.eq_ignore_ascii_case(&candidate)) {
                questions.push(candidate);
            }
        }
    }
    questions
}

/// Exactly `MIN_QUESTIONS` offline questions, used when generation fails outright.
pub fn minimum_fallback(profile: &CandidateProfile) -> Vec<String> {
    fallback_questions(profile)
        .into_iter()
        .take(MIN_QUESTIONS)
        .collect()
}

/// Role-aware offline question bank (five questions, most relevant first).
pub fn fallback_questions(profile: &CandidateProfile) -> Vec<String> {
    let position = profile
        .get(CandidateField::DesiredPosition)
        .unwrap_or_default()
        .to_lowercase();
    let tech = main_technology(profile.get(CandidateField::TechStack).unwrap_or_default());
    let level = profile
        .get(CandidateField::ExperienceYears)
        .map(ExperienceLevel::from_canonical)
        .unwrap_or(ExperienceLevel::MidLevel);

    let has_any = |keywords: &[&str]| keywords.iter().any(|k| mentions(&position, k));

    let bank: [String; 5] = if has_any(&["frontend", "front-end", "react", "angular", "vue", "ui"])
    {
        [
            format!("How do you manage state in {tech} applications?"),
            "How do you optimize frontend performance and loading times?".into(),
            "Describe your approach to responsive design and cross-browser compatibility.".into(),
            "How do you handle API integration and error handling in frontend code?".into(),
            "Explain the difference between controlled and uncontrolled components.".into(),
        ]
    } else if has_any(&["full stack", "fullstack", "full-stack"]) {
        [
            format!("How do you structure a full-stack application using {tech}?"),
            "How do you handle data flow between frontend and backend components?".into(),
            "Describe your approach to API design and frontend integration.".into(),
            "How do you manage deployment and version control for full-stack projects?".into(),
            "What's your strategy for debugging issues across the entire stack?".into(),
        ]
    } else if has_any(&["backend", "back-end", "api", "server", "microservice"]) {
        [
            format!("How do you design RESTful APIs using {tech}?"),
            "Explain your approach to database optimization and query performance.".into(),
            "How do you handle authentication and authorization in backend systems?".into(),
            "Describe your experience with caching strategies and when to use them.".into(),
            "How do you ensure scalability under high traffic?".into(),
        ]
    } else if has_any(&["data scien", "machine learning", "ml", "ai"]) {
        [
            format!("How do you preprocess and clean data using {tech}?"),
            "How do you evaluate and validate machine learning models?".into(),
            "Explain the difference between supervised and unsupervised learning.".into(),
            "Describe your approach to feature engineering and selection.".into(),
            "How do you detect and handle overfitting?".into(),
        ]
    } else if has_any(&["devops", "cloud", "infrastructure", "sre"]) {
        [
            format!("How do you automate deployments using {tech} and CI/CD pipelines?"),
            "Explain your approach to infrastructure as code and containerization.".into(),
            "How do you monitor and troubleshoot production systems?".into(),
            "Describe your experience with cloud platforms and scaling strategies.".into(),
            "How do you ensure security and compliance in deployment processes?".into(),
        ]
    } else if has_any(&["mobile", "ios", "android", "flutter"]) {
        [
            format!("How do you optimize mobile app performance using {tech}?"),
            "How do you handle offline functionality and data synchronization?".into(),
            "Explain your approach to different screen sizes and orientations.".into(),
            "Describe your strategy for app store releases and versioning.".into(),
            "How do you integrate platform-specific native features?".into(),
        ]
    } else {
        match level {
            ExperienceLevel::Junior => [
                format!("Can you explain the core concepts of {tech}?"),
                "Describe a project you've worked on and the technologies you used.".into(),
                "What debugging techniques do you use when your code doesn't work?".into(),
                "How do you approach learning a new technology?".into(),
                "How do you keep your code readable and maintainable?".into(),
            ],
            ExperienceLevel::MidLevel => [
                format!("Can you describe your experience with {tech} and its ecosystem?"),
                "Describe a challenging technical problem you've solved recently.".into(),
                "How do you approach debugging and troubleshooting complex issues?".into(),
                "How do you ensure code quality when working with a team?".into(),
                "What's your preferred development methodology and why?".into(),
            ],
            ExperienceLevel::Senior => [
                format!("How do you architect scalable systems using {tech}?"),
                "How do you make technical decisions and evaluate trade-offs?".into(),
                "Describe your approach to code reviews and mentoring.".into(),
                "Explain your strategy for handling technical debt.".into(),
                "How do you keep up with emerging technologies?".into(),
            ],
        }
    };
    bank.into()
}

/// Whole-word keyword match. Phrases match as substrings; keywords longer than
/// three letters also match as a word prefix ("microservice" in "microservices").
fn mentions(position: &str, keyword: &str) -> bool {
    if keyword.contains(' ') || keyword.contains('-') {
        return position.contains(keyword);
    }
    position
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword || (keyword.len() > 3 && word.starts_with(keyword)))
}

/// The candidate's headline technology: the first well-known one, else the first listed.
pub fn main_technology(tech_stack: &str) -> String {
    let items: Vec<&str> = tech_stack
        .split([',', ';', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for known in KNOWN_TECHNOLOGIES {
        if let Some(item) = items.iter().find(|i| i.eq_ignore_ascii_case(known)) {
            return item.to_string();
        }
    }
    items
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "your main technology".to_string())
}
