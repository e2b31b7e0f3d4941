//! LLM call boundary: the provider trait and the OpenAI implementation.

pub mod http;
pub mod openai;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{FinishReason, GenerationSettings, Usage};

pub use openai::OpenAiProvider;

/// One persona string and one rendered-history string in, one utterance out.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// Persona / system instructions.
    pub instructions: String,
    /// Rendered conversation plus the task for this call.
    pub input: String,
    pub settings: GenerationSettings,
}

/// Response from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// Issue a single completion request.
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;
}
