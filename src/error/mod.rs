//! Error types for Parley.

pub mod provider;

pub use provider::{ErrorCategory, ProviderError};

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::conversation::Role;
use crate::engine::RunId;

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sequence error: {0}")]
    Sequence(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Run {run_id}: {source}")]
    AgentCall {
        run_id: RunId,
        #[source]
        source: AgentCallError,
    },

    #[error("Run {run_id} cancelled after {completed_turns} turns")]
    Cancelled { run_id: RunId, completed_turns: usize },

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParleyError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The failed LLM call, if this error came from one.
    pub fn agent_call(&self) -> Option<&AgentCallError> {
        match self {
            Self::AgentCall { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Which LLM call of a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Turn { role: Role, sequence_index: usize },
    Takeaways,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turn {
                role,
                sequence_index,
            } => write!(f, "{role} turn #{sequence_index}"),
            Self::Takeaways => f.write_str("takeaway extraction"),
        }
    }
}

/// A single LLM invocation that did not produce an utterance.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct AgentCallError {
    pub stage: CallStage,
    #[source]
    pub source: ProviderError,
}

impl AgentCallError {
    pub fn new(stage: CallStage, source: ProviderError) -> Self {
        Self { stage, source }
    }

    pub fn turn(role: Role, sequence_index: usize, source: ProviderError) -> Self {
        Self::new(
            CallStage::Turn {
                role,
                sequence_index,
            },
            source,
        )
    }

    pub fn takeaways(source: ProviderError) -> Self {
        Self::new(CallStage::Takeaways, source)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
