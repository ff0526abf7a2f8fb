//! OpenAI-compatible HTTP client
//!
//! Talks to any endpoint exposing `/v1/chat/completions` (vLLM, LM Studio,
//! Ollama, hosted gateways). The API key is optional; local servers ignore it.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse, MessageRole, StopReason};
use crate::checkpoint::TokenUsage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct OpenAICompatibleClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    http_client: Client,
    timeout: Duration,
}

impl OpenAICompatibleClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            http_client,
            timeout,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Checks that the server answers `/v1/models`
    pub async fn health_check(&self) -> Result<bool, BackendError> {
        let url = format!("{}/v1/models", self.endpoint);

        debug!(url = %url, "Checking service health");

        match self.http_client.get(&url).send().await {
            Ok(response) => {
                let is_healthy = response.status().is_success();
                if is_healthy {
                    info!("Service health check successful");
                } else {
                    warn!(status = %response.status(), "Service health check failed");
                }
                Ok(is_healthy)
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!(endpoint = %self.endpoint, error = %e, "Service unreachable");
                Ok(false)
            }
            Err(e) => Err(BackendError::NetworkError {
                message: format!("Health check failed: {}", e),
            }),
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            error!(timeout_secs = self.timeout.as_secs(), "Service request timed out");
            BackendError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            error!(endpoint = %self.endpoint, "Cannot connect to service");
            BackendError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            error!(error = %e, "Service request error");
            BackendError::NetworkError {
                message: format!("Request failed: {}", e),
            }
        }
    }
}

fn stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        None | Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::Truncated,
        Some(other) => StopReason::Other(other.to_string()),
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);

        let body = OpenAIRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| Message {
                    role: match m.role {
                        MessageRole::System => "system",
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    }
                    .to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: Some(false),
        };

        let start = Instant::now();

        let mut http_request = self.http_client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Service API returned error status");
            return Err(BackendError::from_status(status.as_u16(), body));
        }

        let api_response: OpenAIResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse service response");
            BackendError::InvalidResponse {
                message: format!("JSON parse error: {}", e),
                raw_response: None,
            }
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "No choices in service response".to_string(),
                raw_response: None,
            })?;

        let content = choice
            .message
            .map(|m| m.content)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "No content in service response".to_string(),
                raw_response: None,
            })?;

        let mut llm_response = LLMResponse::text(content, start.elapsed())
            .with_stop_reason(stop_reason(choice.finish_reason.as_deref()));
        if let Some(usage) = api_response.usage {
            llm_response = llm_response.with_usage(TokenUsage::new(
                usage.prompt_tokens,
                usage.completion_tokens,
            ));
        }

        debug!(
            model = %self.model,
            stop_reason = %llm_response.stop_reason,
            elapsed_ms = llm_response.response_time.as_millis() as u64,
            "Service call completed"
        );

        Ok(llm_response)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model_info(&self) -> Option<String> {
        Some(format!("{} @ {}", self.model, self.endpoint))
    }
}

impl fmt::Debug for OpenAICompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAICompatibleClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: Option<Message>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(stop_reason(Some("length")), StopReason::Truncated);
        assert_eq!(stop_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(stop_reason(None), StopReason::EndTurn);
        assert_eq!(
            stop_reason(Some("content_filter")),
            StopReason::Other("content_filter".into())
        );
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{
            "id": "x",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46}
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("length"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, 34);
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client =
            OpenAICompatibleClient::new("http://localhost:8000/", "m", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.model_info().unwrap(), "m @ http://localhost:8000");
    }
}
