use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse, StopReason};
use crate::checkpoint::TokenUsage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted client: replays queued responses in order and records every request
pub struct MockLLMClient {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<LLMRequest>>,
    name: String,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
    pub stop_reason: StopReason,
    pub error: Option<BackendError>,
}

impl MockResponse {
    /// A complete response with a nominal usage of 100 input / 50 output tokens
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: Some(TokenUsage::new(100, 50)),
            stop_reason: StopReason::EndTurn,
            error: None,
        }
    }

    /// A response cut off at the generation budget
    pub fn truncated(content: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::Truncated,
            ..Self::text(content)
        }
    }

    pub fn error(error: BackendError) -> Self {
        Self {
            content: String::new(),
            usage: None,
            stop_reason: StopReason::EndTurn,
            error: Some(error),
        }
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some(TokenUsage::new(input_tokens, output_tokens));
        self
    }

    pub fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::with_name("MockLLM")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(response);
        }
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        self.requests.lock().unwrap().push(request);

        let response =
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| BackendError::Other {
                    message: "MockLLMClient: No more responses in queue".to_string(),
                })?;

        if let Some(error) = response.error {
            return Err(error);
        }

        let mut llm_response = LLMResponse::text(response.content, Duration::from_millis(10))
            .with_stop_reason(response.stop_reason);
        llm_response.usage = response.usage;
        Ok(llm_response)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockLLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLLMClient")
            .field("name", &self.name)
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}
