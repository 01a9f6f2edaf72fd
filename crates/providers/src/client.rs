//! Resilient completion client: budget check, per-attempt timeout and
//! retry with exponential backoff around a single [`Provider`].
//!
//! Transient failures (timeouts, rate limits, network errors, 5xx) are
//! retried up to `max_retries` more times. Anything else propagates on
//! first occurrence. The prompt budget is enforced before the first call,
//! so an oversized prompt never costs a request.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tutorgate_config::{AppConfig, RetryConfig};
use tutorgate_core::error::{LlmError, ProviderError};
use tutorgate_core::prompt::{Prompt, estimate_tokens};
use tutorgate_core::provider::{CompletionRequest, Provider};

/// Retry and timeout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        }
    }

    /// Wait before retry number `retry` (0-based).
    ///
    /// `base * 2^retry`, capped at `max_backoff`. A rate limit's
    /// `retry_after` is honoured up to the same cap.
    pub fn backoff(&self, retry: u32, error: &ProviderError) -> Duration {
        let exponential = self
            .base_backoff
            .saturating_mul(1u32 << retry.min(16))
            .min(self.max_backoff);
        match error {
            ProviderError::RateLimited { retry_after_secs } => exponential
                .max(Duration::from_secs(*retry_after_secs))
                .min(self.max_backoff),
            _ => exponential,
        }
    }

    /// Worst-case time spent in attempts, excluding backoff.
    pub fn attempt_ceiling(&self) -> Duration {
        self.attempt_timeout
            .saturating_mul(self.max_retries.saturating_add(1))
    }
}

/// The LLM client used by the tutoring pipeline.
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    input_budget: usize,
    retry: RetryPolicy,
}

impl LlmClient {
    /// A client with the default budget (1000 input tokens) and retry policy.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            input_budget: tutorgate_config::BudgetConfig::default().input_tokens,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.model.clone())
            .with_input_budget(config.budget.input_tokens)
            .with_retry(RetryPolicy::from_config(&config.retry))
    }

    pub fn with_input_budget(mut self, tokens: usize) -> Self {
        self.input_budget = tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn input_budget(&self) -> usize {
        self.input_budget
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Ask the provider whether it is reachable.
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        self.provider.health_check().await
    }

    /// Complete `prompt`, generating at most `max_output_tokens`.
    ///
    /// Fails with [`LlmError::BudgetExceeded`] before any call when the
    /// prompt is over budget, [`LlmError::Unavailable`] when transient
    /// failures outlast the retries, and [`LlmError::Provider`] for any
    /// non-retriable failure.
    pub async fn complete(
        &self,
        prompt: &Prompt,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let estimated_input = prompt.estimated_tokens();
        if estimated_input > self.input_budget {
            warn!(
                provider = %self.provider.name(),
                estimated_input_tokens = estimated_input,
                budget = self.input_budget,
                retries = 0u32,
                success = false,
                "Prompt over input budget, not sending"
            );
            return Err(LlmError::BudgetExceeded {
                estimated: estimated_input,
                budget: self.input_budget,
            });
        }

        let started = Instant::now();
        let max_attempts = self.retry.max_retries.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let request = CompletionRequest {
                model: self.model.clone(),
                system: prompt.system.clone(),
                prompt: prompt.user.clone(),
                max_tokens: max_output_tokens,
                temperature,
            };

            let outcome =
                match tokio::time::timeout(self.retry.attempt_timeout, self.provider.complete(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(format!(
                        "no response within {}ms",
                        self.retry.attempt_timeout.as_millis()
                    ))),
                };

            let retries = attempt - 1;
            match outcome {
                Ok(response) => {
                    info!(
                        provider = %self.provider.name(),
                        model = %response.model,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        estimated_input_tokens = estimated_input,
                        estimated_output_tokens = estimate_tokens(&response.text),
                        retries,
                        success = true,
                        "LLM completion"
                    );
                    if let Some(usage) = response.usage {
                        tracing::debug!(
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            total_tokens = usage.total_tokens,
                            "Provider-reported usage"
                        );
                    }
                    return Ok(response.text);
                }
                Err(error) if !error.is_transient() => {
                    warn!(
                        provider = %self.provider.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        estimated_input_tokens = estimated_input,
                        retries,
                        success = false,
                        error = %error,
                        "LLM completion failed, not retriable"
                    );
                    return Err(LlmError::Provider(error));
                }
                Err(error) if attempt >= max_attempts => {
                    warn!(
                        provider = %self.provider.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        estimated_input_tokens = estimated_input,
                        retries,
                        success = false,
                        error = %error,
                        "LLM completion failed, retries exhausted"
                    );
                    return Err(LlmError::Unavailable {
                        attempts: attempt,
                        last: error,
                    });
                }
                Err(error) => {
                    let wait = self.retry.backoff(retries, &error);
                    warn!(
                        provider = %self.provider.name(),
                        attempt,
                        max_attempts,
                        backoff_ms = wait.as_millis() as u64,
                        error = %error,
                        "Transient LLM failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
