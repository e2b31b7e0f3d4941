//! Convenience re-exports for common use.

pub use crate::agent::{AgentInvoker, AgentSpec, LlmAgent};
pub use crate::config::{AppConfig, RunConfig};
pub use crate::conversation::{ConversationHistory, Role, Turn};
pub use crate::engine::{ConversationEngine, EngineEvent, EngineState, RunOutcome, TakeawayExtractor};
pub use crate::error::{AgentCallError, ParleyError, ProviderError, Result};
pub use crate::output::{FileOutputSink, OutputSink};
pub use crate::provider::{CompletionRequest, CompletionResponse, ModelProvider, OpenAiProvider};
pub use crate::session::{run_session, SessionOptions, SessionReport};
pub use crate::types::{GenerationSettings, Usage};
