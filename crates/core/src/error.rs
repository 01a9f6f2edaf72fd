//! Error types for the tutorgate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Errors are layered: [`ProviderError`] describes what the upstream
//! completion service did, [`LlmError`] what the resilient client made of
//! it, and [`Error`] what the pipeline reports to its caller.

use thiserror::Error;

/// The top-level error type for pipeline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request itself is malformed. Surfaced to the caller as a client
    /// error and never retried.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The service cannot produce tutoring output at all (bad credentials,
    /// provider not configured). Distinct from a normal tutoring response.
    #[error("Tutoring service unavailable: {0}")]
    Service(ProviderError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A request field failed a semantic check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field '{0}' must not be blank")]
    Blank(&'static str),

    #[error("field '{field}' is {actual} characters long (max {max})")]
    TooLong {
        field: &'static str,
        actual: usize,
        max: usize,
    },
}

/// Failures reported by an LLM provider transport.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts, rate limits, transport failures and 5xx responses are
    /// transient. Everything else is a property of the request or the
    /// credentials and will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited { .. } | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 408,
            Self::AuthenticationFailed(_)
            | Self::InvalidRequest(_)
            | Self::ModelNotFound(_)
            | Self::NotConfigured(_) => false,
        }
    }

    /// Credential or setup problems that no request can work around.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::NotConfigured(_))
    }
}

/// Failures of the resilient LLM client wrapper.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Raised before any network call when the prompt is too large.
    #[error("Prompt needs ~{estimated} input tokens, budget is {budget}")]
    BudgetExceeded { estimated: usize, budget: usize },

    /// Transient failures persisted through every retry.
    #[error("Provider unavailable after {attempts} attempt(s): {last}")]
    Unavailable { attempts: u32, last: ProviderError },

    /// A non-retriable provider failure, propagated on first occurrence.
    #[error(transparent)]
    Provider(ProviderError),
}
