//! Producing the next utterance for a role.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::conversation::{ConversationHistory, Role};
use crate::error::{AgentCallError, ProviderError};
use crate::provider::{CompletionRequest, ModelProvider};
use crate::types::{FinishReason, GenerationSettings};

use super::prompts;
use super::spec::AgentSpec;

/// Capability that speaks for one role of the dialogue.
///
/// An invocation issues exactly one model call and never retries on its own;
/// failures surface as [`AgentCallError`].
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Role this invoker speaks for.
    fn role(&self) -> Role;

    /// Display name of the agent.
    fn name(&self) -> &str;

    /// Produce the next utterance given the history so far.
    async fn invoke(&self, history: &ConversationHistory) -> Result<String, AgentCallError>;
}

/// [`AgentInvoker`] backed by a [`ModelProvider`].
pub struct LlmAgent {
    spec: AgentSpec,
    instructions: String,
    goal: String,
    model: String,
    settings: GenerationSettings,
    provider: Arc<dyn ModelProvider>,
}

impl LlmAgent {
    /// Create an agent; the persona's instructions are resolved against `goal` here, once.
    pub fn new(
        spec: AgentSpec,
        goal: impl Into<String>,
        model: impl Into<String>,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        let goal = goal.into();
        let instructions = spec.resolve_instructions(&goal);
        Self {
            spec,
            instructions,
            goal,
            model: model.into(),
            settings: GenerationSettings::default(),
            provider,
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }


    fn request_for(&self, history: &ConversationHistory) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            instructions: self.instructions.clone(),
            input: prompts::turn_input(history, self.spec.role, &self.goal),
            settings: self.settings.clone(),
        }
    }
}

#[async_trait]
impl AgentInvoker for LlmAgent {
    fn role(&self) -> Role {
        self.spec.role
    }

    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn invoke(&self, history: &ConversationHistory) -> Result<String, AgentCallError> {
        let role = self.spec.role;
        let sequence_index = history.next_index();
        let request = self.request_for(history);

        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| AgentCallError::turn(role, sequence_index, e))?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(AgentCallError::turn(
                role,
                sequence_index,
                ProviderError::EmptyResponse,
            ));
        }

        if response.finish_reason == Some(FinishReason::Length) {
            warn!(
                agent = %self.spec.name,
                %role,
                turn = sequence_index,
                "Utterance was cut off by the token limit"
            );
        }
        debug!(
            agent = %self.spec.name,
            %role,
            turn = sequence_index,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total_tokens,
            finish_reason = ?response.finish_reason,
            "Agent produced utterance"
        );
        Ok(text.to_string())
    }
}
