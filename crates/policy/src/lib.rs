//! Pedagogical policies: declarative rules for what the tutor may answer
//! and how it should adapt.
//!
//! Both policies are pure and synchronous:
//!
//! ```text
//! query ──▶ ScopeRules ──▶ Allow / Block / Ambiguous
//! snapshot ──▶ InterventionPolicy ──▶ urgency + teaching style
//! ```
//!
//! The model-backed half of scope validation (for `Ambiguous` queries)
//! lives in `tutorgate-tutor`, next to the LLM client it needs.

pub mod intervention;
pub mod scope;

pub use intervention::InterventionPolicy;
pub use scope::{LocalDecision, RuleVerdict, ScopeRule, ScopeRules};

/// Errors from building policies out of configuration.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid scope pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown behavioral state '{0}'")]
    UnknownState(String),
}
