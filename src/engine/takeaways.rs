//! Post-run distillation of the dialogue into takeaways.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::{prompts, AgentSpec};
use crate::conversation::ConversationHistory;
use crate::error::{AgentCallError, ProviderError};
use crate::provider::{CompletionRequest, ModelProvider};
use crate::types::{FinishReason, GenerationSettings};

/// Turns a finished conversation into bullet-point takeaways, speaking with
/// the Expert's voice.
pub struct TakeawayExtractor {
    provider: Arc<dyn ModelProvider>,
    model: String,
    goal: String,
    expert_instructions: String,
    expert_description: String,
    settings: GenerationSettings,
}

impl TakeawayExtractor {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: impl Into<String>,
        goal: impl Into<String>,
        expert: &AgentSpec,
    ) -> Self {
        let goal = goal.into();
        Self {
            expert_instructions: expert.resolve_instructions(&goal),
            expert_description: expert.description.clone(),
            provider,
            model: model.into(),
            goal,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Issue the single takeaway call over the full rendering of `history`.
    pub async fn extract(&self, history: &ConversationHistory) -> Result<String, AgentCallError> {
        let transcript = history.render_as_text();
        let request = CompletionRequest {
            model: self.model.clone(),
            instructions: self.expert_instructions.clone(),
            input: prompts::takeaway_input(&transcript, &self.goal, &self.expert_description),
            settings: self.settings.clone(),
        };

        debug!(transcript_len = transcript.len(), "Requesting takeaways");
        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(AgentCallError::takeaways)?;

        let takeaways = response.text.trim();
        if takeaways.is_empty() {
            return Err(AgentCallError::takeaways(ProviderError::EmptyResponse));
        }

        if response.finish_reason == Some(FinishReason::Length) {
            warn!("Takeaways were cut off by the token limit");
        }
        info!(
            len = takeaways.len(),
            total_tokens = response.usage.total_tokens,
            finish_reason = ?response.finish_reason,
            "Generated takeaways"
        );
        Ok(takeaways.to_string())
    }
}
