//! # tutorgate core
//!
//! Domain types, traits, and error definitions for the tutorgate
//! pedagogical firewall. This crate has **no framework dependencies**; it
//! defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The two external capabilities (the upstream behavioral engine and the
//! hosted LLM) are modelled as plain inputs and a one-method trait. This
//! enables:
//! - Swapping LLM backends via configuration
//! - Deterministic testing with stub providers
//! - A clean dependency graph (all crates depend inward on core)

pub mod behavior;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod tutoring;

// Re-export key types at crate root for ergonomics
pub use behavior::{BehavioralSnapshot, CognitiveState, IterationState, ProvenanceState};
pub use error::{Error, LlmError, ProviderError, Result, ValidationError};
pub use prompt::{Prompt, estimate_tokens};
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
pub use tutoring::{
    InterventionDirective, ScopeDecision, TeachingStyle, TutoringRequest, TutoringResponse,
    Urgency,
};
