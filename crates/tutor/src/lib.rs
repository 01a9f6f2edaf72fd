//! # tutorgate tutor
//!
//! The tutoring pipeline. A [`Firewall`] owns the scope validator, the
//! intervention policy, the prompt builder and the resilient LLM client,
//! and runs every request through them in a fixed order:
//!
//! ```text
//! TutoringRequest
//!   → validate  (ScopeValidator: rules, then model label, fail-open)
//!   → adapt     (InterventionPolicy)
//!   → compose   (PromptBuilder, bounded by the input budget)
//!   → generate  (LlmClient: timeout, retry, backoff)
//!   → assemble  TutoringResponse
//! ```

pub mod firewall;
pub mod prompt;
pub mod scope;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use firewall::Firewall;
pub use prompt::PromptBuilder;
pub use scope::ScopeValidator;
