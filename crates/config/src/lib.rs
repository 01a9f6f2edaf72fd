//! Configuration loading, validation, and management for tutorgate.
//!
//! Loads configuration from `~/.tutorgate/config.toml` with environment
//! variable overrides. Validates all settings at startup; nothing is
//! reloaded while the process runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tutorgate_core::behavior::{CognitiveState, IterationState, ProvenanceState};
use tutorgate_core::tutoring::Urgency;

/// The root configuration structure.
///
/// Maps directly to `~/.tutorgate/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Which hosted backend to talk to: "openai", "groq" or "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL, required when `provider = "custom"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model identifier sent with every completion
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for tutoring replies (scope checks always use 0.0)
    #[serde(default = "default_tutor_temperature")]
    pub tutor_temperature: f32,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub intervention: InterventionConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_tutor_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("tutor_temperature", &self.tutor_temperature)
            .field("budget", &self.budget)
            .field("retry", &self.retry)
            .field("scope", &self.scope)
            .field("intervention", &self.intervention)
            .finish()
    }
}

/// Token budgets. Estimates use ~4 characters per token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_input_tokens")]
    pub input_tokens: usize,

    #[serde(default = "default_output_tokens")]
    pub output_tokens: u32,
}

fn default_input_tokens() -> usize {
    1000
}
fn default_output_tokens() -> u32 {
    150
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            input_tokens: default_input_tokens(),
            output_tokens: default_output_tokens(),
        }
    }
}

/// Retry and timeout policy for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    2
}
fn default_base_backoff_ms() -> u64 {
    250
}
fn default_max_backoff_ms() -> u64 {
    2000
}
fn default_attempt_timeout_secs() -> u64 {
    10
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

/// Extra scope rules on top of the built-in set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Regexes (case-insensitive) that block a query
    #[serde(default)]
    pub extra_block: Vec<String>,

    /// Regexes (case-insensitive) that mark a query as learning-oriented
    #[serde(default)]
    pub extra_allow: Vec<String>,

    /// Ask the model about queries no rule matches. When off they pass.
    #[serde(default = "default_true")]
    pub llm_fallback: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            extra_block: vec![],
            extra_allow: vec![],
            llm_fallback: true,
        }
    }
}

/// Overrides for the behavioral urgency table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterventionConfig {
    /// State label (e.g. "PASSIVE_IDLE") → urgency
    #[serde(default)]
    pub urgency: BTreeMap<String, Urgency>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.tutorgate/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TUTORGATE_API_KEY` (highest priority)
    /// - `GROQ_API_KEY` / `OPENAI_API_KEY`, matching the selected provider
    /// - `TUTORGATE_PROVIDER`, `TUTORGATE_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("TUTORGATE_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("TUTORGATE_MODEL") {
            self.model = model;
        }

        if let Some(key) = lookup("TUTORGATE_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            let provider_var = match self.provider.as_str() {
                "groq" => "GROQ_API_KEY",
                _ => "OPENAI_API_KEY",
            };
            self.api_key = lookup(provider_var);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tutorgate")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.tutor_temperature) {
            return Err(ConfigError::ValidationError(
                "tutor_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        match self.provider.as_str() {
            "openai" | "groq" => {}
            "custom" if self.api_url.is_some() => {}
            "custom" => {
                return Err(ConfigError::ValidationError(
                    "provider \"custom\" requires api_url".into(),
                ));
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown provider '{other}' (expected openai, groq or custom)"
                )));
            }
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.budget.input_tokens == 0 || self.budget.output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "token budgets must be greater than zero".into(),
            ));
        }

        if self.budget.output_tokens as usize >= self.budget.input_tokens {
            return Err(ConfigError::ValidationError(
                "budget.output_tokens must be smaller than budget.input_tokens".into(),
            ));
        }

        if self.retry.base_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::ValidationError(
                "retry.base_backoff_ms must not exceed retry.max_backoff_ms".into(),
            ));
        }

        if self.retry.attempt_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "retry.attempt_timeout_secs must be greater than zero".into(),
            ));
        }

        for pattern in self.scope.extra_block.iter().chain(&self.scope.extra_allow) {
            regex_lite::Regex::new(pattern).map_err(|e| {
                ConfigError::ValidationError(format!("invalid scope pattern '{pattern}': {e}"))
            })?;
        }

        for label in self.intervention.urgency.keys() {
            let known = label.parse::<CognitiveState>().is_ok()
                || label.parse::<IterationState>().is_ok()
                || label.parse::<ProvenanceState>().is_ok();
            if !known {
                return Err(ConfigError::ValidationError(format!(
                    "unknown behavioral state '{label}' in [intervention.urgency]"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            tutor_temperature: default_tutor_temperature(),
            budget: BudgetConfig::default(),
            retry: RetryConfig::default(),
            scope: ScopeConfig::default(),
            intervention: InterventionConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
