//! Per-category conversion of source units through the provider
//!
//! [`convert_unit`] owns the retry policy: a truncated response is retried
//! once with double the generation budget, and a second truncation fails the
//! unit. Every call that reported usage is returned to the caller for
//! accounting, whatever the outcome.

mod converters;
pub mod json;
pub mod prompt;
mod response;

pub use converters::{
    converter_for, ConfigurationConverter, ControllerConverter, EntityConverter, JobConverter,
    ListenerConverter, RepositoryConverter, ServiceConverter,
};
pub use json::{extract_json_object, parse_json_response, ParseError};
pub use response::{
    parse_response, snake_case, CodeField, Conversion, ConvertedUnit, GeneratedFile,
};

use crate::checkpoint::{Stage, TokenUsage};
use crate::llm::{BackendError, LLMClient};
use crate::scanner::{SourceUnit, UnitCategory};
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Project-level facts every prompt carries
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub project_name: String,
    pub base_package: String,
    pub source_framework: String,
    pub target_language: String,
    pub target_module: String,
    /// Extra one-line facts (database, broker, replaced dependencies)
    pub notes: Vec<String>,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self {
            project_name: "project".to_string(),
            base_package: String::new(),
            source_framework: "Spring Boot".to_string(),
            target_language: "Go".to_string(),
            target_module: "app".to_string(),
            notes: Vec::new(),
        }
    }
}

pub trait Converter: Send + Sync {
    fn category(&self) -> UnitCategory;

    fn stage(&self) -> Stage {
        Stage::for_category(self.category())
    }

    /// Action recorded in the audit log for each call
    fn action(&self) -> String {
        format!("convert_{}", self.category().as_str())
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String;

    fn user_prompt(&self, unit: &SourceUnit, ctx: &ConversionContext) -> String {
        prompt::user_prompt(unit, ctx)
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError>;
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("provider error: {0}")]
    Provider(#[from] BackendError),

    #[error("response truncated again at the escalated budget of {max_tokens} tokens")]
    Truncated { max_tokens: u32 },

    #[error("unparseable response: {0}")]
    Parse(#[from] ParseError),

    #[error("conversion cancelled")]
    Cancelled,

    #[error("output {} was already written by another unit in this stage", .path.display())]
    Conflict { path: PathBuf },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Generation budget for one unit: the baseline, then double on truncation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationBudget {
    pub baseline_tokens: u32,
    pub temperature: f32,
}

impl GenerationBudget {
    pub fn new(baseline_tokens: u32, temperature: f32) -> Self {
        Self {
            baseline_tokens,
            temperature,
        }
    }

    pub fn escalated_tokens(&self) -> u32 {
        self.baseline_tokens.saturating_mul(2)
    }
}

/// One provider call that reported token usage
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub attempt: u32,
    pub max_tokens: u32,
    pub usage: TokenUsage,
    pub truncated: bool,
    pub prompt: String,
    pub response: String,
}

#[derive(Debug)]
pub struct UnitAttempt {
    pub calls: Vec<ProviderCall>,
    pub outcome: Result<Conversion, ConvertError>,
}

pub async fn convert_unit(
    client: &dyn LLMClient,
    converter: &dyn Converter,
    unit: &SourceUnit,
    ctx: &ConversionContext,
    budget: GenerationBudget,
    cancel: &CancellationToken,
) -> UnitAttempt {
    let system = converter.system_prompt(ctx);
    let user = converter.user_prompt(unit, ctx);
    let mut calls = Vec::new();

    let budgets = [budget.baseline_tokens, budget.escalated_tokens()];
    for (attempt, &max_tokens) in budgets.iter().enumerate() {
        let attempt = attempt as u32 + 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BackendError::Cancelled),
            result = client.analyze(&system, &user, max_tokens, budget.temperature) => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(BackendError::Cancelled) => {
                return UnitAttempt {
                    calls,
                    outcome: Err(ConvertError::Cancelled),
                }
            }
            Err(e) => {
                return UnitAttempt {
                    calls,
                    outcome: Err(ConvertError::Provider(e)),
                }
            }
        };

        let truncated = response.is_truncated();
        if let Some(usage) = response.usage {
            calls.push(ProviderCall {
                attempt,
                max_tokens,
                usage,
                truncated,
                prompt: user.clone(),
                response: response.content.clone(),
            });
        }

        if truncated {
            warn!(unit = %unit.name, attempt, max_tokens, "Provider response truncated");
            continue;
        }

        debug!(unit = %unit.name, attempt, "Parsing provider response");
        return UnitAttempt {
            calls,
            outcome: converter.parse(&response.content).map_err(ConvertError::from),
        };
    }

    UnitAttempt {
        calls,
        outcome: Err(ConvertError::Truncated {
            max_tokens: budget.escalated_tokens(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLLMClient, MockResponse};
    use std::path::PathBuf;

    fn unit() -> SourceUnit {
        SourceUnit {
            name: "User".into(),
            package: "com.acme".into(),
            path: PathBuf::from("/src/User.java"),
            relative_path: "src/main/java/com/acme/User.java".into(),
            module: ".".into(),
            content: "@Entity\nclass User {}\n".into(),
            supertypes: vec![],
            interfaces: vec![],
            annotations: vec!["Entity".into()],
            imports: vec![],
        }
    }

    const OK: &str = r#"{"name": "User", "code": "type User struct{}", "notes": [], "requires_review": false, "review_reason": ""}"#;

    async fn run(client: &MockLLMClient) -> UnitAttempt {
        convert_unit(
            client,
            &EntityConverter,
            &unit(),
            &ConversionContext::default(),
            GenerationBudget::new(1000, 0.1),
            &CancellationToken::new(),
        )
        .await
    }

    #[tokio::test]
    async fn test_single_call_success() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::text(OK));

        let attempt = run(&client).await;
        assert!(matches!(attempt.outcome, Ok(Conversion::Converted(_))));
        assert_eq!(attempt.calls.len(), 1);
        assert_eq!(client.requests()[0].max_tokens, Some(1000));
    }

    #[tokio::test]
    async fn test_truncation_retried_with_double_budget() {
        let client = MockLLMClient::new();
        client.add_responses([MockResponse::truncated("{\"name\": \"Us"), MockResponse::text(OK)]);

        let attempt = run(&client).await;
        assert!(attempt.outcome.is_ok());
        assert_eq!(attempt.calls.len(), 2);
        assert!(attempt.calls[0].truncated);
        let budgets: Vec<_> = client.requests().iter().map(|r| r.max_tokens).collect();
        assert_eq!(budgets, vec![Some(1000), Some(2000)]);
    }

    #[tokio::test]
    async fn test_second_truncation_fails_unit() {
        let client = MockLLMClient::new();
        client.add_responses([MockResponse::truncated("{"), MockResponse::truncated("{")]);

        let attempt = run(&client).await;
        assert!(matches!(
            attempt.outcome,
            Err(ConvertError::Truncated { max_tokens: 2000 })
        ));
        assert_eq!(attempt.calls.len(), 2);
        assert_eq!(client.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_parse_failure_still_reports_usage() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::text("sorry, I can't").with_usage(40, 5));

        let attempt = run(&client).await;
        assert!(matches!(attempt.outcome, Err(ConvertError::Parse(_))));
        assert_eq!(attempt.calls[0].usage, TokenUsage::new(40, 5));
    }

    #[tokio::test]
    async fn test_provider_error_has_no_calls() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::error(BackendError::RateLimitError {
            retry_after: Some(3),
        }));

        let attempt = run(&client).await;
        assert!(matches!(attempt.outcome, Err(ConvertError::Provider(_))));
        assert!(attempt.calls.is_empty());
    }

    #[tokio::test]
    async fn test_calls_without_usage_are_not_listed() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::text(OK).without_usage());

        let attempt = run(&client).await;
        assert!(attempt.outcome.is_ok());
        assert!(attempt.calls.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::text(OK));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let attempt = convert_unit(
            &client,
            &EntityConverter,
            &unit(),
            &ConversionContext::default(),
            GenerationBudget::new(1000, 0.1),
            &cancel,
        )
        .await;
        assert!(matches!(attempt.outcome, Err(ConvertError::Cancelled)));
    }
}
