//! Tutoring request/response value objects and the decisions made about them.
//!
//! Nothing here outlives a single request.

use crate::behavior::BehavioralSnapshot;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest learner query accepted, in characters.
pub const MAX_QUERY_CHARS: usize = 500;

/// Returned verbatim whenever a query is out of scope. Never model-generated.
pub const OUT_OF_SCOPE_MESSAGE: &str = "I'm here to help you learn algorithmic problem-solving. \
I can help you understand the problem, think through your approach, debug your code, \
or learn a concept. I can't write complete solutions or help with unrelated topics. \
Ask me about your coding problem and I'll guide you!";

/// Returned when the tutor could not generate a reply in time.
pub const FALLBACK_MESSAGE: &str = "I'm having trouble thinking this through right now. \
Take another look at what the problem asks for and try one small step. \
Ask me again in a moment and I'll be ready to help!";

/// A learner's request for help on one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutoringRequest {
    /// Opaque, used only for log correlation.
    #[serde(default)]
    pub session_id: String,

    pub problem_id: String,

    pub problem_description: String,

    /// May be empty in proactive hint mode.
    #[serde(default)]
    pub user_query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehavioralSnapshot>,
}

impl TutoringRequest {
    pub fn new(
        problem_id: impl Into<String>,
        problem_description: impl Into<String>,
        user_query: impl Into<String>,
    ) -> Self {
        Self {
            session_id: String::new(),
            problem_id: problem_id.into(),
            problem_description: problem_description.into(),
            user_query: user_query.into(),
            current_code: None,
            behavior: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.current_code = Some(code.into());
        self
    }

    pub fn with_behavior(mut self, snapshot: BehavioralSnapshot) -> Self {
        self.behavior = Some(snapshot);
        self
    }

    /// The code snapshot, if present and not just whitespace.
    pub fn code(&self) -> Option<&str> {
        self.current_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    /// Semantic checks the transport layer cannot make.
    ///
    /// Oversized descriptions and code are accepted; the prompt builder
    /// truncates them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.problem_id.trim().is_empty() {
            return Err(ValidationError::Blank("problem_id"));
        }
        if self.problem_description.trim().is_empty() {
            return Err(ValidationError::Blank("problem_description"));
        }
        let query_chars = self.user_query.chars().count();
        if query_chars > MAX_QUERY_CHARS {
            return Err(ValidationError::TooLong {
                field: "user_query",
                actual: query_chars,
                max: MAX_QUERY_CHARS,
            });
        }
        Ok(())
    }

    /// [`validate`](Self::validate) plus a non-blank query. Only the hint
    /// entry point may run without a question.
    pub fn validate_question(&self) -> Result<(), ValidationError> {
        self.validate()?;
        if self.user_query.trim().is_empty() {
            return Err(ValidationError::Blank("user_query"));
        }
        Ok(())
    }
}

/// Outcome of scope validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDecision {
    pub is_allowed: bool,
    /// Which rule or check decided. Diagnostics only, never shown to learners.
    pub reason: String,
}

impl ScopeDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            is_allowed: true,
            reason: reason.into(),
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            is_allowed: false,
            reason: reason.into(),
        }
    }
}

/// How urgently the tutor should intervene. Ordered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn is_triggered(self) -> bool {
        self >= Self::Low
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Teaching adjustment the prompt should carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachingStyle {
    #[default]
    SubtleHint,
    SupportiveCheckIn,
    GentleNudge,
    ConcreteStartingPoint,
    ReflectiveQuestion,
    TargetedDebugging,
    BigPicture,
    ExplainYourCode,
    ThoughtfulEdits,
    ProactiveNudge,
}

impl TeachingStyle {
    pub fn tag(self) -> &'static str {
        match self {
            Self::SubtleHint => "subtle_hint",
            Self::SupportiveCheckIn => "supportive_check_in",
            Self::GentleNudge => "gentle_nudge",
            Self::ConcreteStartingPoint => "concrete_starting_point",
            Self::ReflectiveQuestion => "reflective_question",
            Self::TargetedDebugging => "targeted_debugging",
            Self::BigPicture => "big_picture",
            Self::ExplainYourCode => "explain_your_code",
            Self::ThoughtfulEdits => "thoughtful_edits",
            Self::ProactiveNudge => "proactive_nudge",
        }
    }
}

impl fmt::Display for TeachingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What the intervention policy decided for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionDirective {
    pub urgency: Urgency,
    pub style: TeachingStyle,
    /// Compact description of the non-neutral states, for the prompt.
    pub behavioral_context: String,
}

impl InterventionDirective {
    pub fn triggered(&self) -> bool {
        self.urgency.is_triggered()
    }
}

impl Default for InterventionDirective {
    fn default() -> Self {
        Self {
            urgency: Urgency::None,
            style: TeachingStyle::SubtleHint,
            behavioral_context: "Normal engagement".into(),
        }
    }
}

/// What the caller gets back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutoringResponse {
    pub message: String,
    pub is_allowed: bool,
    pub intervention_triggered: bool,
    /// Request-completion time.
    pub timestamp: DateTime<Utc>,
}

impl TutoringResponse {
    /// A generated (or fallback) reply to an in-scope request.
    pub fn allowed(message: impl Into<String>, directive: &InterventionDirective) -> Self {
        Self {
            message: message.into(),
            is_allowed: true,
            intervention_triggered: directive.triggered(),
            timestamp: Utc::now(),
        }
    }

    /// The fixed reply to an out-of-scope request.
    pub fn out_of_scope() -> Self {
        Self {
            message: OUT_OF_SCOPE_MESSAGE.into(),
            is_allowed: false,
            intervention_triggered: false,
            timestamp: Utc::now(),
        }
    }

    pub fn fallback(directive: &InterventionDirective) -> Self {
        Self::allowed(FALLBACK_MESSAGE, directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_is_ordered() {
        assert!(Urgency::None < Urgency::Low);
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::Medium < Urgency::High);
        assert!(!Urgency::None.is_triggered());
        assert!(Urgency::Low.is_triggered());
    }

    #[test]
    fn validate_accepts_empty_query() {
        let req = TutoringRequest::new("two-sum", "Find two numbers that add up", "");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn question_must_not_be_blank() {
        let req = TutoringRequest::new("two-sum", "Find two numbers that add up", " \n");
        assert_eq!(
            req.validate_question(),
            Err(ValidationError::Blank("user_query"))
        );
        let req = TutoringRequest::new("two-sum", "Find two numbers that add up", "why?");
        assert!(req.validate_question().is_ok());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let req = TutoringRequest::new("  ", "desc", "q");
        assert_eq!(req.validate(), Err(ValidationError::Blank("problem_id")));

        let req = TutoringRequest::new("p1", "\n", "q");
        assert_eq!(
            req.validate(),
            Err(ValidationError::Blank("problem_description"))
        );
    }

    #[test]
    fn validate_rejects_long_query() {
        let req = TutoringRequest::new("p1", "desc", "é".repeat(MAX_QUERY_CHARS + 1));
        match req.validate() {
            Err(ValidationError::TooLong { actual, max, .. }) => {
                assert_eq!(actual, MAX_QUERY_CHARS + 1);
                assert_eq!(max, MAX_QUERY_CHARS);
            }
            other => panic!("Expected TooLong, got: {other:?}"),
        }
    }

    #[test]
    fn whitespace_code_is_absent() {
        let req = TutoringRequest::new("p1", "desc", "q").with_code("   \n");
        assert!(req.code().is_none());
        let req = req.with_code("print(1)");
        assert_eq!(req.code(), Some("print(1)"));
    }

    #[test]
    fn out_of_scope_response_is_fixed() {
        let resp = TutoringResponse::out_of_scope();
        assert!(!resp.is_allowed);
        assert!(!resp.intervention_triggered);
        assert_eq!(resp.message, OUT_OF_SCOPE_MESSAGE);
    }

    #[test]
    fn fallback_carries_intervention_flag() {
        let directive = InterventionDirective {
            urgency: Urgency::Medium,
            style: TeachingStyle::GentleNudge,
            behavioral_context: "Cognitive: PASSIVE_IDLE".into(),
        };
        let resp = TutoringResponse::fallback(&directive);
        assert!(resp.is_allowed);
        assert!(resp.intervention_triggered);
        assert_eq!(resp.message, FALLBACK_MESSAGE);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: TutoringRequest = serde_json::from_str(
            r#"{"problem_id":"p1","problem_description":"desc",
                "behavior":{"cognitive":"PASSIVE_IDLE"}}"#,
        )
        .unwrap();
        assert!(req.user_query.is_empty());
        assert!(req.session_id.is_empty());
        assert!(req.behavior.is_some());
    }

    #[test]
    fn styles_serialize_as_tags() {
        let json = serde_json::to_string(&TeachingStyle::ConcreteStartingPoint).unwrap();
        assert_eq!(json, "\"concrete_starting_point\"");
        assert_eq!(serde_json::to_string(&Urgency::High).unwrap(), "\"high\"");
    }
}
