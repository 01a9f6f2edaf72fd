//! Shared test helpers for pipeline tests.

use std::sync::Mutex;
use std::time::Duration;
use tutorgate_core::error::ProviderError;
use tutorgate_core::provider::{CompletionRequest, CompletionResponse, Provider};
use tutorgate_providers::RetryPolicy;

/// A mock provider that returns scripted outcomes in order.
///
/// `failing` and `always_err` repeat their single outcome forever. Otherwise
/// a call past the end of the script panics, so `new(vec![])` asserts that
/// the provider is never reached.
pub struct MockProvider {
    script: Mutex<Vec<Result<CompletionResponse, ProviderError>>>,
    repeat_last: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(script: Vec<Result<CompletionResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            repeat_last: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies with each text in turn.
    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(text_response(t))).collect())
    }

    /// Always fails with a transient 503.
    pub fn failing() -> Self {
        Self::always_err(ProviderError::ApiError {
            status_code: 503,
            message: "Service Unavailable".into(),
        })
    }

    /// Always fails with `error`.
    pub fn always_err(error: ProviderError) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(vec![Err(error)])
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!("MockProvider: no scripted outcome for call #{call}");
        }
        if self.repeat_last && script.len() == 1 {
            script[0].clone()
        } else {
            script.remove(0)
        }
    }
}

pub fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse::text(text, "mock-model")
}

/// Retries with negligible waits, for use under paused time.
pub fn instant_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        attempt_timeout: Duration::from_secs(10),
    }
}
