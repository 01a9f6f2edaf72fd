//! The firewall orchestrator: runs one tutoring request through
//! validate → adapt → compose → generate → assemble.
//!
//! The only errors a caller sees are a malformed request and a provider
//! that cannot be used at all (bad or missing credentials). Every other
//! failure degrades to a fixed message.

use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use tutorgate_config::AppConfig;
use tutorgate_core::error::{Error, LlmError, Result};
use tutorgate_core::prompt::chars_for_tokens;
use tutorgate_core::provider::Provider;
use tutorgate_core::tutoring::{TutoringRequest, TutoringResponse};
use tutorgate_policy::{InterventionPolicy, PolicyError};
use tutorgate_providers::LlmClient;
use uuid::Uuid;

use crate::prompt::PromptBuilder;
use crate::scope::ScopeValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ask,
    Hint,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Hint => "hint",
        }
    }
}

/// The pedagogical firewall between learners and the model.
pub struct Firewall {
    llm: LlmClient,
    scope: ScopeValidator,
    intervention: InterventionPolicy,
    prompts: PromptBuilder,
    output_tokens: u32,
    temperature: f32,
}

fn config_error(e: PolicyError) -> Error {
    Error::Config {
        message: e.to_string(),
    }
}

impl Firewall {
    /// A firewall with built-in policies and default budgets.
    pub fn new(llm: LlmClient) -> Self {
        let budget = tutorgate_config::BudgetConfig::default();
        Self {
            prompts: PromptBuilder::new(llm.input_budget()),
            llm,
            scope: ScopeValidator::default(),
            intervention: InterventionPolicy::new(),
            output_tokens: budget.output_tokens,
            temperature: AppConfig::default().tutor_temperature,
        }
    }

    /// Wire the whole pipeline from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Result<Self> {
        let scope = ScopeValidator::from_config(&config.scope).map_err(config_error)?;
        let intervention =
            InterventionPolicy::from_config(&config.intervention).map_err(config_error)?;

        Ok(Self {
            llm: LlmClient::from_config(provider, config),
            scope,
            intervention,
            prompts: PromptBuilder::from_config(&config.budget),
            output_tokens: config.budget.output_tokens,
            temperature: config.tutor_temperature,
        })
    }

    pub fn with_scope(mut self, scope: ScopeValidator) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_intervention(mut self, intervention: InterventionPolicy) -> Self {
        self.intervention = intervention;
        self
    }

    pub fn with_output_tokens(mut self, tokens: u32) -> Self {
        self.output_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Answer a learner question. A blank query is a validation error.
    pub async fn ask(&self, request: &TutoringRequest) -> Result<TutoringResponse> {
        self.handle(request, Mode::Ask).await
    }

    /// Proactive hint. The query may be empty and intervention urgency is
    /// at least LOW.
    pub async fn hint(&self, request: &TutoringRequest) -> Result<TutoringResponse> {
        self.handle(request, Mode::Hint).await
    }

    async fn handle(&self, request: &TutoringRequest, mode: Mode) -> Result<TutoringResponse> {
        let span = info_span!(
            "tutoring_request",
            request_id = %Uuid::new_v4(),
            problem_id = %request.problem_id,
            session_id = %request.session_id,
            mode = mode.as_str(),
        );
        self.run(request, mode).instrument(span).await
    }

    async fn run(&self, request: &TutoringRequest, mode: Mode) -> Result<TutoringResponse> {
        match mode {
            Mode::Ask => request.validate_question()?,
            Mode::Hint => request.validate()?,
        }
        let started = Instant::now();

        // 1. Validate
        let decision = self
            .scope
            .classify(&self.llm, &request.user_query, request.code())
            .await;
        if !decision.is_allowed {
            info!(reason = %decision.reason, "Request out of scope");
            return Ok(TutoringResponse::out_of_scope());
        }

        // 2. Adapt
        let snapshot = request.behavior.as_ref();
        let directive = match mode {
            Mode::Ask => self.intervention.evaluate(snapshot),
            Mode::Hint => self.intervention.evaluate_hint(snapshot),
        };

        // 3. Compose
        let prompt = match mode {
            Mode::Ask => self.prompts.build(request, &directive),
            Mode::Hint => self.prompts.build_hint(request, &directive),
        };

        // 4. Generate
        let reply = match self
            .llm
            .complete(&prompt, self.output_tokens, self.temperature)
            .await
        {
            Ok(text) if text.trim().is_empty() => {
                warn!("Empty completion, using fallback");
                None
            }
            Ok(text) => Some(clip_reply(
                text.trim(),
                chars_for_tokens(self.output_tokens as usize),
            )),
            Err(LlmError::Provider(e)) if e.is_auth() => {
                warn!(error = %e, "Provider rejected credentials");
                return Err(Error::Service(e));
            }
            Err(e) => {
                warn!(error = %e, "Generation failed, using fallback");
                None
            }
        };

        // 5. Assemble
        let response = match reply {
            Some(message) => TutoringResponse::allowed(message, &directive),
            None => TutoringResponse::fallback(&directive),
        };

        info!(
            scope = %decision.reason,
            urgency = %directive.urgency,
            style = %directive.style,
            intervention_triggered = response.intervention_triggered,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tutoring response ready"
        );

        Ok(response)
    }
}

/// Clip `text` to `max_chars`, preferring a word boundary, ending in `…`.
pub fn clip_reply(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let head: String = text.chars().take(max_chars - 1).collect();
    let cut = match head.rfind(char::is_whitespace) {
        Some(i) if i > 0 => head[..i].trim_end(),
        _ => head.as_str(),
    };
    format!("{cut}…")
}
