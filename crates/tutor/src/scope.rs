//! Scope validation: the local rule filter, then a model check for the
//! queries no rule decides.
//!
//! This stage fails open. A model error or an answer that is not exactly
//! one of the two labels permits the request; only a clear rule match or a
//! clean `OUT_OF_SCOPE` label blocks it.

use tracing::{debug, warn};
use tutorgate_config::ScopeConfig;
use tutorgate_core::prompt::Prompt;
use tutorgate_core::tutoring::ScopeDecision;
use tutorgate_policy::{LocalDecision, PolicyError, ScopeRules};
use tutorgate_providers::LlmClient;

/// Characters of code passed to the model as context.
pub const SCOPE_CODE_CONTEXT_CHARS: usize = 200;

/// Output budget for the label.
pub const SCOPE_MAX_TOKENS: u32 = 10;

const SCOPE_SYSTEM: &str = "You are a scope validator for a programming tutor. \
Decide whether the learner's message is about:
1. Getting help with an algorithmic or coding problem
2. Understanding code concepts, debugging, or learning
3. Asking for hints or explanations

Respond with ONLY IN_SCOPE or OUT_OF_SCOPE. No explanations.";

/// Two-stage scope classifier.
#[derive(Debug, Clone)]
pub struct ScopeValidator {
    rules: ScopeRules,
    llm_fallback: bool,
}

impl Default for ScopeValidator {
    fn default() -> Self {
        Self::new(ScopeRules::builtin())
    }
}

impl ScopeValidator {
    pub fn new(rules: ScopeRules) -> Self {
        Self {
            rules,
            llm_fallback: true,
        }
    }

    pub fn from_config(config: &ScopeConfig) -> Result<Self, PolicyError> {
        Ok(Self::new(ScopeRules::from_config(config)?).with_llm_fallback(config.llm_fallback))
    }

    /// Disable the model stage. Ambiguous queries are then allowed.
    pub fn with_llm_fallback(mut self, enabled: bool) -> Self {
        self.llm_fallback = enabled;
        self
    }

    /// Classify a learner query.
    ///
    /// An empty query always passes: it is a request for a proactive hint.
    /// Code is never pattern-matched, only passed to the model as context.
    pub async fn classify(&self, llm: &LlmClient, query: &str, code: Option<&str>) -> ScopeDecision {
        if query.trim().is_empty() {
            return ScopeDecision::allow("proactive_hint");
        }

        match self.rules.evaluate(query) {
            LocalDecision::Allow { rule } => return ScopeDecision::allow(format!("rule:{rule}")),
            LocalDecision::Block { rule } => return ScopeDecision::block(format!("rule:{rule}")),
            LocalDecision::Ambiguous => {}
        }

        if !self.llm_fallback {
            debug!("No scope rule matched and model check disabled, allowing");
            return ScopeDecision::allow("no_rule_fail_open");
        }

        let prompt = scope_prompt(query, code);
        match llm.complete(&prompt, SCOPE_MAX_TOKENS, 0.0).await {
            Ok(answer) => match parse_label(&answer) {
                Some(true) => ScopeDecision::allow("llm_in_scope"),
                Some(false) => ScopeDecision::block("llm_out_of_scope"),
                None => {
                    warn!(answer = %answer, "Unparseable scope label, failing open");
                    ScopeDecision::allow("llm_unparseable_fail_open")
                }
            },
            Err(e) => {
                warn!(error = %e, "Scope check failed, failing open");
                ScopeDecision::allow("llm_error_fail_open")
            }
        }
    }
}

/// The classification prompt.
pub fn scope_prompt(query: &str, code: Option<&str>) -> Prompt {
    let user = match code {
        Some(code) => {
            let excerpt: String = code.chars().take(SCOPE_CODE_CONTEXT_CHARS).collect();
            format!("Learner's code (excerpt):\n```\n{excerpt}\n```\n\nLearner's message: {query}")
        }
        None => format!("Learner's message: {query}"),
    };
    Prompt::new(SCOPE_SYSTEM, user)
}

/// `Some(true)` for IN_SCOPE, `Some(false)` for OUT_OF_SCOPE, `None` otherwise.
///
/// Case-insensitive; surrounding punctuation and whitespace are ignored and
/// spaces or hyphens may stand in for underscores. Anything else, including
/// a label buried in a sentence, is unparseable.
pub fn parse_label(answer: &str) -> Option<bool> {
    let normalized: String = answer
        .trim_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();

    match normalized.as_str() {
        "IN_SCOPE" => Some(true),
        "OUT_OF_SCOPE" => Some(false),
        _ => None,
    }
}
