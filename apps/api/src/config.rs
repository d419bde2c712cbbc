use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{GenerationOptions, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::screening::prompts::DEFAULT_COMPANY_NAME;

const DEFAULT_STORAGE_PATH: &str = "data/candidates.json";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub llm_timeout: Duration,
    pub company_name: String,
    /// When set, candidates go to PostgreSQL instead of the JSON file.
    pub database_url: Option<String>,
    pub data_storage_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            model_name: optional_env("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_env("MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            temperature: parse_env("TEMPERATURE", DEFAULT_TEMPERATURE)?,
            llm_timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
            company_name: optional_env("COMPANY_NAME")
                .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            database_url: optional_env("DATABASE_URL"),
            data_storage_path: optional_env("DATA_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string())
                .into(),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        let problems = config.validate();
        if !problems.is_empty() {
            anyhow::bail!("Invalid configuration: {}", problems.join("; "));
        }
        Ok(config)
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            model: self.model_name.clone(),
        }
    }

    /// Every configuration problem found, empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.anthropic_api_key.trim().is_empty() {
            problems.push("ANTHROPIC_API_KEY is empty".to_string());
        }
        if let Err(e) = self.generation_options().validate() {
            problems.push(e.to_string());
        }
        if self.company_name.trim().is_empty() {
            problems.push("COMPANY_NAME is empty".to_string());
        }
        if self.llm_timeout.is_zero() {
            problems.push("LLM_TIMEOUT_SECS must be greater than zero".to_string());
        }
        problems
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
