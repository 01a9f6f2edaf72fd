//! LLM provider transport for tutorgate.
//!
//! [`OpenAiCompatProvider`] speaks the chat-completions wire format used by
//! OpenAI, Groq and self-hosted gateways. [`LlmClient`] wraps any
//! `tutorgate_core::Provider` with the budget, timeout and retry rules the
//! tutoring pipeline relies on.

pub mod client;
pub mod openai_compat;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{LlmClient, RetryPolicy};
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use std::time::Duration;
use tutorgate_config::AppConfig;
use tutorgate_core::error::ProviderError;
use tutorgate_core::provider::Provider;

/// Slack added to the per-attempt timeout for the HTTP transport ceiling.
const TRANSPORT_SLACK: Duration = Duration::from_secs(5);

/// Build the configured provider.
///
/// Fails with [`ProviderError::NotConfigured`] when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "no API key; set TUTORGATE_API_KEY or api_key in config.toml".into(),
        )
    })?;

    let timeout = Duration::from_secs(config.retry.attempt_timeout_secs) + TRANSPORT_SLACK;

    let provider = match config.provider.as_str() {
        "openai" => OpenAiCompatProvider::openai(api_key, timeout)?,
        "groq" => OpenAiCompatProvider::groq(api_key, timeout)?,
        "custom" => {
            let url = config.api_url.clone().ok_or_else(|| {
                ProviderError::NotConfigured("provider \"custom\" requires api_url".into())
            })?;
            OpenAiCompatProvider::new("custom", url, api_key, timeout)?
        }
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider '{other}'"
            )));
        }
    };

    tracing::debug!(
        provider = %provider.name(),
        base_url = %provider.base_url(),
        model = %config.model,
        "Provider configured"
    );

    Ok(Arc::new(provider))
}
