//! Code-analysis provider abstraction
//!
//! A trait-based layer so hosted providers (via genai), any OpenAI-compatible
//! endpoint, and the scripted mock can be used interchangeably.

mod client;
mod error;
mod genai;
mod mock;
mod openai_compatible;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use self::genai::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use openai_compatible::OpenAICompatibleClient;
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole, StopReason};
