use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse};
use async_trait::async_trait;

#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }

    /// Single-shot system + user prompt with an explicit budget
    async fn analyze(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LLMResponse, BackendError> {
        let request = LLMRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ])
        .with_max_tokens(max_tokens)
        .with_temperature(temperature);
        self.chat(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct EchoClient;

    #[async_trait]
    impl LLMClient for EchoClient {
        async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
            let content = format!(
                "{}|{}|{:?}",
                request.system_prompt().unwrap_or_default(),
                request.user_prompt().unwrap_or_default(),
                request.max_tokens
            );
            Ok(LLMResponse::text(content, Duration::from_millis(1)))
        }

        fn name(&self) -> &str {
            "Echo"
        }
    }

    #[tokio::test]
    async fn test_analyze_builds_request() {
        let client = EchoClient;
        let response = client.analyze("sys", "user", 512, 0.2).await.unwrap();
        assert_eq!(response.content, "sys|user|Some(512)");
        assert!(client.model_info().is_none());
    }
}
