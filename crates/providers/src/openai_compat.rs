//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, Groq (OpenAI compatibility layer), Ollama, vLLM and
//! any endpoint exposing `/v1/chat/completions`.
//!
//! Only non-streaming chat completions are needed: every tutoring reply is
//! a single short message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use tutorgate_core::error::ProviderError;
use tutorgate_core::provider::*;

/// Fallback when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// `request_timeout` is a transport-level ceiling; the resilient client
    /// applies its own, usually tighter, per-attempt timeout on top.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>, request_timeout: Duration) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, request_timeout)
    }

    /// Create a Groq provider (convenience constructor).
    pub fn groq(api_key: impl Into<String>, request_timeout: Duration) -> Result<Self, ProviderError> {
        Self::new(
            "groq",
            "https://api.groq.com/openai/v1",
            api_key,
            request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(request: &CompletionRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ApiMessage {
                role: "system".into(),
                content: Some(request.system.clone()),
            });
        }
        messages.push(ApiMessage {
            role: "user".into(),
            content: Some(request.prompt.clone()),
        });
        messages
    }
}

/// Map a non-success HTTP status to a provider error.
fn status_error(status: u16, retry_after: Option<u64>, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        401 | 403 => {
            ProviderError::AuthenticationFailed("Invalid API key or insufficient permissions".into())
        }
        404 => ProviderError::ModelNotFound(body),
        408 => ProviderError::Timeout(format!("Provider returned 408: {body}")),
        400..=499 => ProviderError::InvalidRequest(format!("status {status}: {body}")),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<u64> {
    value?.to_str().ok()?.trim().parse().ok()
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: &request.model,
            messages: Self::to_api_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status != 200 {
            let retry_after = parse_retry_after(response.headers().get(reqwest::header::RETRY_AFTER));
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
            return Err(status_error(status, retry_after, error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            usage,
            model: api_response.model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            401 | 403 => Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            )),
            _ => Ok(response.status().is_success()),
        }
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".into(),
            system: "You are a tutor".into(),
            prompt: "Why is my loop infinite?".into(),
            max_tokens: 150,
            temperature: 0.7,
        }
    }

    #[test]
    fn groq_constructor() {
        let p = OpenAiCompatProvider::groq("gsk-test", Duration::from_secs(5)).unwrap();
        assert_eq!(p.name(), "groq");
        assert_eq!(p.base_url(), "https://api.groq.com/openai/v1");
    }

    #[test]
    fn trailing_slash_trimmed() {
        let p = OpenAiCompatProvider::new("custom", "http://localhost:11434/v1/", "k", Duration::from_secs(5))
            .unwrap();
        assert_eq!(p.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn message_conversion() {
        let msgs = OpenAiCompatProvider::to_api_messages(&request());
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].role, "user");
        assert_eq!(msgs[1].content.as_deref(), Some("Why is my loop infinite?"));
    }

    #[test]
    fn empty_system_is_omitted() {
        let mut req = request();
        req.system.clear();
        let msgs = OpenAiCompatProvider::to_api_messages(&req);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "user");
    }

    #[test]
    fn request_body_shape() {
        let req = request();
        let body = ApiRequest {
            model: &req.model,
            messages: OpenAiCompatProvider::to_api_messages(&req),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["content"], "You are a tutor");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(429, Some(7), String::new()),
            ProviderError::RateLimited { retry_after_secs: 7 }
        ));
        assert!(matches!(
            status_error(429, None, String::new()),
            ProviderError::RateLimited {
                retry_after_secs: DEFAULT_RETRY_AFTER_SECS
            }
        ));
        assert!(status_error(401, None, String::new()).is_auth());
        assert!(matches!(
            status_error(404, None, "no such model".into()),
            ProviderError::ModelNotFound(_)
        ));
        assert!(matches!(
            status_error(422, None, String::new()),
            ProviderError::InvalidRequest(_)
        ));
        let server = status_error(502, None, "bad gateway".into());
        assert!(server.is_transient());
        assert!(!status_error(400, None, String::new()).is_transient());
    }

    #[test]
    fn parse_chat_response() {
        let json = r#"{
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"message": {"role": "assistant", "content": "What does your base case return?"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 9, "total_tokens": 129}
        }"#;
        let resp: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("What does your base case return?")
        );
        assert_eq!(resp.usage.unwrap().total_tokens, 129);
    }

    #[test]
    fn retry_after_header_parsing() {
        let value = reqwest::header::HeaderValue::from_static(" 3 ");
        assert_eq!(parse_retry_after(Some(&value)), Some(3));
        let date = reqwest::header::HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }
}
