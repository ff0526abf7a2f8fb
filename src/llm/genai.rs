//! GenAI-based provider client
//!
//! Uses the `genai` crate for a single interface over hosted providers
//! (Anthropic, OpenAI, Gemini, Groq, xAI, Ollama).

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole, StopReason};
use crate::checkpoint::TokenUsage;
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub struct GenAIClient {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAIClient {
    /// Creates a client for `provider`/`model`.
    ///
    /// `endpoint` overrides the provider's default base URL; credentials still
    /// come from the provider's usual environment variable.
    pub fn new(
        provider: AdapterKind,
        model: impl Into<String>,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Self {
        let model = model.into();

        let client = if let Some(endpoint_url) = endpoint {
            debug!(provider = provider.as_str(), endpoint = %endpoint_url, "Using custom endpoint");

            let model_clone = model.clone();
            let resolver = ServiceTargetResolver::from_resolver_fn(
                move |_service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                    let auth = match provider.default_key_env_name() {
                        Some(api_key_var) => AuthData::from_env(api_key_var),
                        None => AuthData::from_single(""),
                    };

                    Ok(ServiceTarget {
                        endpoint: Endpoint::from_owned(endpoint_url.clone()),
                        auth,
                        model: ModelIden::new(provider, &model_clone),
                    })
                },
            );

            Client::builder()
                .with_service_target_resolver(resolver)
                .build()
        } else {
            Client::default()
        };

        debug!(provider = provider.as_str(), model = %model, "Created GenAI client");

        Self {
            client,
            model,
            provider,
            timeout,
        }
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(&msg.content),
            MessageRole::User => GenAIChatMessage::user(&msg.content),
            MessageRole::Assistant => GenAIChatMessage::assistant(&msg.content),
        }
    }
}

/// genai does not surface a finish reason, so a completion that used the whole
/// budget is treated as truncated
fn stop_reason(completion_tokens: Option<u64>, max_tokens: Option<u32>) -> StopReason {
    match (completion_tokens, max_tokens) {
        (Some(used), Some(budget)) if used >= u64::from(budget) => StopReason::Truncated,
        _ => StopReason::EndTurn,
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let start = Instant::now();

        let messages: Vec<GenAIChatMessage> =
            request.messages.iter().map(Self::convert_message).collect();
        let genai_request = GenAIChatRequest::new(messages);

        let mut options = ChatOptions::default();
        if let Some(temp) = request.temperature {
            options = options.with_temperature(temp as f64);
        }
        if let Some(max_tokens) = request.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, genai_request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!(provider = self.provider.as_str(), error = %e, "Provider API error");
                return Err(BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider.as_str(), e),
                    status_code: None,
                });
            }
            Err(_) => {
                error!(
                    provider = self.provider.as_str(),
                    timeout_secs = self.timeout.as_secs(),
                    "Provider request timed out"
                );
                return Err(BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let content = response.first_text().unwrap_or_default().to_string();

        let prompt_tokens = response.usage.prompt_tokens.map(|t| t.max(0) as u64);
        let completion_tokens = response.usage.completion_tokens.map(|t| t.max(0) as u64);

        let mut llm_response = LLMResponse::text(content, start.elapsed())
            .with_stop_reason(stop_reason(completion_tokens, request.max_tokens));
        if prompt_tokens.is_some() || completion_tokens.is_some() {
            llm_response = llm_response.with_usage(TokenUsage::new(
                prompt_tokens.unwrap_or(0),
                completion_tokens.unwrap_or(0),
            ));
        }

        debug!(
            provider = self.provider.as_str(),
            input_tokens = prompt_tokens.unwrap_or(0),
            output_tokens = completion_tokens.unwrap_or(0),
            stop_reason = %llm_response.stop_reason,
            elapsed_ms = llm_response.response_time.as_millis() as u64,
            "Provider call completed"
        );

        Ok(llm_response)
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genai_client_creation() {
        let client = GenAIClient::new(
            AdapterKind::Anthropic,
            "claude-sonnet-4-5",
            None,
            Duration::from_secs(30),
        );

        assert_eq!(client.name(), "Anthropic");
        assert_eq!(client.model_info(), Some("claude-sonnet-4-5".to_string()));
    }

    #[test]
    fn test_stop_reason_from_budget() {
        assert_eq!(stop_reason(Some(8192), Some(8192)), StopReason::Truncated);
        assert_eq!(stop_reason(Some(100), Some(8192)), StopReason::EndTurn);
        assert_eq!(stop_reason(None, Some(8192)), StopReason::EndTurn);
        assert_eq!(stop_reason(Some(100), None), StopReason::EndTurn);
    }

    #[test]
    fn test_debug_impl() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<GenAIClient>();
    }
}
