//! Conversation state machine: drives one screening session from greeting to hand-off.
//!
//! Progresses linearly: Greeting → Collecting(0..7) → GeneratingQuestions →
//! AskingQuestion(0..n) → Closing → Ended. An exit keyword jumps straight to
//! Closing from any Collecting or AskingQuestion state.
//!
//! The LLM is only consulted in GeneratingQuestions and Closing. Its failures
//! never leave this module: the machine substitutes offline questions or the
//! deterministic closing template instead.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::prompts::screening_system;
use crate::llm_client::{GenerationOptions, TextGenerator};
use crate::screening::profile::{CandidateField, CandidateProfile};
use crate::screening::prompts::{
    field_acknowledgement, next_question, question_line, questions_intro, FallbackTarget,
    PromptBuilder, PromptKind, SESSION_ENDED_MESSAGE,
};
use crate::screening::questions::{bound_questions, minimum_fallback, parse_questions};
use crate::screening::validation::validate;

/// Whole-message, case-insensitive exit phrases.
pub const EXIT_KEYWORDS: &[&str] = &["bye", "exit", "quit", "thank you", "thanks"];

/// AI-written closings shorter than this are treated as unusable.
const MIN_CLOSING_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "index", rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    Collecting(usize),
    GeneratingQuestions,
    AskingQuestion(usize),
    Closing,
    Ended,
}

impl ConversationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greeting => write!(f, "greeting"),
            Self::Collecting(i) => write!(f, "collecting({i})"),
            Self::GeneratingQuestions => write!(f, "generating_questions"),
            Self::AskingQuestion(j) => write!(f, "asking_question({j})"),
            Self::Closing => write!(f, "closing"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Result of feeding one message into the machine.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Text to show the candidate.
    pub reply: String,
    /// State after the turn completed.
    pub state: ConversationState,
    /// Set exactly once per conversation, on the turn that reaches `Ended`.
    pub handoff: Option<CandidateProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub session_id: Uuid,
    pub state: ConversationState,
    pub profile: CandidateProfile,
    pub questions_generated: usize,
    pub answers_provided: usize,
    pub message_count: u32,
}

pub fn is_exit_keyword(input: &str) -> bool {
    let normalized = input
        .trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase();
    EXIT_KEYWORDS.contains(&normalized.as_str())
}

pub struct Conversation {
    profile: CandidateProfile,
    state: ConversationState,
    prompts: PromptBuilder,
    options: GenerationOptions,
    message_count: u32,
    handed_off: bool,
}

impl Conversation {
    pub fn new(prompts: PromptBuilder, options: GenerationOptions) -> Self {
        Self {
            profile: CandidateProfile::new(),
            state: ConversationState::Greeting,
            prompts,
            options,
            message_count: 0,
            handed_off: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.profile.session_id()
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    /// Mutable access for the persistence layer (`created_at` stamping).
    pub fn profile_mut(&mut self) -> &mut CandidateProfile {
        &mut self.profile
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            session_id: self.session_id(),
            state: self.state,
            profile: self.profile.clone(),
            questions_generated: self.profile.technical_questions.len(),
            answers_provided: self.profile.technical_answers.len(),
            message_count: self.message_count,
        }
    }

    /// Emits the greeting and opens field collection. Idempotent once past Greeting.
    pub fn start(&mut self) -> Turn {
        if self.state != ConversationState::Greeting {
            let reply = self.current_request();
            return self.turn(reply);
        }
        self.state = ConversationState::Collecting(0);
        info!("Session {} started", self.session_id());
        let reply = format!(
            "{}\n\n{}",
            self.prompts.build(PromptKind::Greeting, &self.profile),
            self.prompts
                .build(PromptKind::RequestField(CandidateField::FullName), &self.profile)
        );
        self.turn(reply)
    }

    /// Processes one candidate message to completion.
    pub async fn handle_message(&mut self, input: &str, llm: &dyn TextGenerator) -> Turn {
        self.message_count += 1;

        match self.state {
            ConversationState::Greeting => self.start(),
            ConversationState::Ended => self.turn(SESSION_ENDED_MESSAGE.to_string()),
            ConversationState::Collecting(_) | ConversationState::AskingQuestion(_)
                if is_exit_keyword(input) =>
            {
                info!(
                    "Session {}: exit keyword in state {}",
                    self.session_id(),
                    self.state
                );
                self.close(llm, None).await
            }
            ConversationState::Collecting(i) => self.collect(i, input, llm).await,
            ConversationState::GeneratingQuestions => {
                let reply = self.generate_questions(llm).await;
                self.turn(reply)
            }
            ConversationState::AskingQuestion(j) => self.answer(j, input, llm).await,
            ConversationState::Closing => self.close(llm, None).await,
        }
    }

    async fn collect(&mut self, index: usize, input: &str, llm: &dyn TextGenerator) -> Turn {
        let Some(field) = CandidateField::at(index) else {
            let reply = self.generate_questions(llm).await;
            return self.turn(reply);
        };

        if input.trim().is_empty() {
            let reply = self
                .prompts
                .build(PromptKind::Fallback(FallbackTarget::Field(field)), &self.profile);
            return self.turn(reply);
        }

        let result = validate(field, input);
        let value = match (result.ok, result.normalized_value) {
            (true, Some(value)) => value,
            _ => {
                let error = result
                    .error_message
                    .unwrap_or_else(|| format!("Please provide a valid {}.", field.label()));
                let reply = format!(
                    "{error}\n\n{}",
                    self.prompts
                        .build(PromptKind::RequestField(field), &self.profile)
                );
                return self.turn(reply);
            }
        };

        let acknowledgement = field_acknowledgement(field, &value);
        self.profile.set(field, value);

        let reply = match CandidateField::at(index + 1) {
            Some(next) => {
                self.state = ConversationState::Collecting(index + 1);
                format!(
                    "{acknowledgement}\n\n{}",
                    self.prompts
                        .build(PromptKind::RequestField(next), &self.profile)
                )
            }
            None => {
                let intro = self.generate_questions(llm).await;
                format!("{acknowledgement}\n\n{intro}")
            }
        };
        self.turn(reply)
    }

    async fn generate_questions(&mut self, llm: &dyn TextGenerator) -> String {
        self.state = ConversationState::GeneratingQuestions;
        let prompt = self
            .prompts
            .build(PromptKind::GenerateQuestions, &self.profile);
        let system = screening_system(self.prompts.company_name());

        let questions = match llm.generate(&system, &prompt, &self.options).await {
            Ok(text) => bound_questions(parse_questions(&text), &self.profile),
            Err(e) => {
                warn!(
                    "Session {}: question generation failed, using fallback questions: {e}",
                    self.session_id()
                );
                minimum_fallback(&self.profile)
            }
        };

        info!(
            "Session {}: {} technical questions ready",
            self.session_id(),
            questions.len()
        );
        self.profile.technical_questions = questions;
        self.profile.technical_answers.clear();
        self.state = ConversationState::AskingQuestion(0);
        questions_intro(&self.profile, self.profile.technical_questions.len())
    }

    async fn answer(&mut self, index: usize, input: &str, llm: &dyn TextGenerator) -> Turn {
        let total = self.profile.technical_questions.len();

        if input.trim().is_empty() {
            let reply = self.prompts.build(
                PromptKind::Fallback(FallbackTarget::Question { index, total }),
                &self.profile,
            );
            return self.turn(reply);
        }

        debug_assert_eq!(self.profile.technical_answers.len(), index);
        self.profile.technical_answers.push(input.trim().to_string());

        if index + 1 < total {
            self.state = ConversationState::AskingQuestion(index + 1);
            let reply = next_question(
                index + 1,
                total,
                &self.profile.technical_questions[index + 1],
            );
            return self.turn(reply);
        }

        let preface = format!(
            "Excellent! You've completed all {total} technical questions. \
             Thank you for your detailed responses."
        );
        self.close(llm, Some(preface)).await
    }

    async fn close(&mut self, llm: &dyn TextGenerator, preface: Option<String>) -> Turn {
        self.state = ConversationState::Closing;
        let closing = self.closing_message(llm).await;
        self.state = ConversationState::Ended;

        let handoff = if self.handed_off {
            None
        } else {
            self.handed_off = true;
            Some(self.profile.clone())
        };
        info!(
            "Session {} ended ({} fields, {}/{} answers)",
            self.session_id(),
            self.profile.filled_count(),
            self.profile.technical_answers.len(),
            self.profile.technical_questions.len()
        );

        let reply = match preface {
            Some(preface) => format!("{preface}\n\n{closing}"),
            None => closing,
        };
        Turn {
            reply,
            state: self.state,
            handoff,
        }
    }

    /// AI-written closing if it honors the personalization contract, else the template.
    async fn closing_message(&self, llm: &dyn TextGenerator) -> String {
        let instruction = self.prompts.closing_instruction(&self.profile);
        let system = screening_system(self.prompts.company_name());

        match llm.generate(&system, &instruction, &self.options).await {
            Ok(text) if self.is_usable_closing(&text) => text,
            Ok(_) => {
                warn!(
                    "Session {}: generated closing was not personalized, using template",
                    self.session_id()
                );
                self.prompts.build(PromptKind::Closing, &self.profile)
            }
            Err(e) => {
                warn!(
                    "Session {}: closing generation failed, using template: {e}",
                    self.session_id()
                );
                self.prompts.build(PromptKind::Closing, &self.profile)
            }
        }
    }

    fn is_usable_closing(&self, text: &str) -> bool {
        let mentions = |field| {
            self.profile
                .get(field)
                .map_or(true, |value| text.contains(value))
        };
        text.chars().count() > MIN_CLOSING_CHARS
            && !text.contains('{')
            && !text.contains('[')
            && mentions(CandidateField::FullName)
            && mentions(CandidateField::TechStack)
    }

    /// The prompt for whatever the machine is currently waiting on.
    fn current_request(&self) -> String {
        match self.state {
            ConversationState::Collecting(i) => CandidateField::at(i)
                .map(|f| self.prompts.build(PromptKind::RequestField(f), &self.profile))
                .unwrap_or_default(),
            ConversationState::AskingQuestion(j) => {
                let total = self.profile.technical_questions.len();
                question_line(
                    j,
                    total,
                    self.profile
                        .technical_questions
                        .get(j)
                        .map(String::as_str)
                        .unwrap_or_default(),
                )
            }
            ConversationState::Ended => SESSION_ENDED_MESSAGE.to_string(),
            _ => self.prompts.build(PromptKind::Greeting, &self.profile),
        }
    }

    fn turn(&self, reply: String) -> Turn {
        Turn {
            reply,
            state: self.state,
            handoff: None,
        }
    }
}
