//! Conversation engine: the turn loop, its lifecycle and termination policy.
//!
//! A run alternates one User turn and one Expert turn per iteration for a
//! fixed number of iterations, then asks the [`TakeawayExtractor`] to distill
//! the result. Any failed call moves the run to [`EngineState::Failed`]; the
//! history collected up to that point is returned in the [`RunOutcome`] so the
//! caller can still persist it.

pub mod events;
pub mod state;
pub mod takeaways;

pub use events::{EngineEvent, EventSink};
pub use state::EngineState;
pub use takeaways::TakeawayExtractor;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agent::{AgentInvoker, LlmAgent};
use crate::config::RunConfig;
use crate::conversation::{ConversationHistory, Role, Turn};
use crate::error::{ParleyError, Result};
use crate::provider::ModelProvider;

/// Unique run identifier.
pub type RunId = Uuid;

/// Final result of a run, successful or not.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: RunId,
    /// `Done` or `Failed`.
    pub state: EngineState,
    /// State the run was in when it failed.
    pub failed_during: Option<EngineState>,
    pub history: ConversationHistory,
    pub takeaways: Option<String>,
    pub error: Option<ParleyError>,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        self.state == EngineState::Done
    }
}

/// Drives one User/Expert dialogue to completion.
pub struct ConversationEngine {
    run_id: RunId,
    max_iterations: u32,
    seed: Option<String>,
    user: Arc<dyn AgentInvoker>,
    expert: Arc<dyn AgentInvoker>,
    extractor: TakeawayExtractor,
    state: EngineState,
    event_sink: Option<EventSink>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("run_id", &self.run_id)
            .field("max_iterations", &self.max_iterations)
            .field("state", &self.state)
            .field("user", &self.user.name())
            .field("expert", &self.expert.name())
            .finish()
    }
}

impl ConversationEngine {
    /// Create an engine from explicit invokers.
    ///
    /// Fails with [`ParleyError::Config`] when `max_iterations` is not positive
    /// or an invoker is bound to the wrong role. No call is made.
    pub fn new(
        config: &RunConfig,
        user: Arc<dyn AgentInvoker>,
        expert: Arc<dyn AgentInvoker>,
        extractor: TakeawayExtractor,
    ) -> Result<Self> {
        if config.max_iterations <= 0 {
            return Err(ParleyError::config(format!(
                "maxIterations must be a positive integer, got {}",
                config.max_iterations
            )));
        }
        let max_iterations = u32::try_from(config.max_iterations).map_err(|_| {
            ParleyError::config(format!(
                "maxIterations {} is out of range (at most {})",
                config.max_iterations,
                u32::MAX
            ))
        })?;
        if user.role() != Role::User {
            return Err(ParleyError::config(format!(
                "user agent '{}' is bound to the {} role",
                user.name(),
                user.role()
            )));
        }
        if expert.role() != Role::Expert {
            return Err(ParleyError::config(format!(
                "expert agent '{}' is bound to the {} role",
                expert.name(),
                expert.role()
            )));
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            max_iterations,
            seed: config.seed_history.clone(),
            user,
            expert,
            extractor,
            state: EngineState::Idle,
            event_sink: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Create an engine whose agents and extractor all call `provider`.
    pub fn from_run_config(config: &RunConfig, provider: Arc<dyn ModelProvider>) -> Result<Self> {
        let user = LlmAgent::new(
            config.user_agent_spec.clone(),
            config.goal.clone(),
            config.model_id.clone(),
            provider.clone(),
        )
        .with_settings(config.settings.clone());
        let expert = LlmAgent::new(
            config.expert_agent_spec.clone(),
            config.goal.clone(),
            config.model_id.clone(),
            provider.clone(),
        )
        .with_settings(config.settings.clone());
        let extractor = TakeawayExtractor::new(
            provider,
            config.model_id.clone(),
            config.goal.clone(),
            &config.expert_agent_spec,
        )
        .with_settings(config.settings.clone());

        Self::new(config, Arc::new(user), Arc::new(expert), extractor)
    }

    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Abort the run before the next turn, or before extraction, once `token`
    /// is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run the dialogue and the takeaway extraction.
    pub async fn run(mut self) -> RunOutcome {
        info!(
            run_id = %self.run_id,
            max_iterations = self.max_iterations,
            user = self.user.name(),
            expert = self.expert.name(),
            "Starting conversation run"
        );

        let mut history = ConversationHistory::new();
        match self.drive(&mut history).await {
            Ok(takeaways) => {
                info!(run_id = %self.run_id, turns = history.len(), "Conversation run finished");
                RunOutcome {
                    run_id: self.run_id,
                    state: self.state,
                    failed_during: None,
                    history,
                    takeaways: Some(takeaways),
                    error: None,
                }
            }
            Err(err) => {
                let failed_during = self.state;
                error!(
                    run_id = %self.run_id,
                    state = %failed_during,
                    turns = history.len(),
                    error = %err,
                    "Conversation run failed"
                );
                self.force_failed();
                RunOutcome {
                    run_id: self.run_id,
                    state: self.state,
                    failed_during: Some(failed_during),
                    history,
                    takeaways: None,
                    error: Some(err),
                }
            }
        }
    }

    async fn drive(&mut self, history: &mut ConversationHistory) -> Result<String> {
        self.transition(EngineState::Seeding)?;
        if let Some(seed) = self.seed.take() {
            history.seed(seed)?;
        }

        self.transition(EngineState::Running)?;
        for iteration in 1..=self.max_iterations {
            self.take_turn(history, Role::User).await?;
            self.take_turn(history, Role::Expert).await?;
            info!(
                run_id = %self.run_id,
                iteration,
                max_iterations = self.max_iterations,
                "Completed iteration"
            );
        }

        self.ensure_not_cancelled(history)?;
        self.transition(EngineState::Extracting)?;
        let takeaways = self
            .extractor
            .extract(history)
            .await
            .map_err(|source| ParleyError::AgentCall {
                run_id: self.run_id,
                source,
            })?;

        self.transition(EngineState::Done)?;
        Ok(takeaways)
    }

    fn ensure_not_cancelled(&self, history: &ConversationHistory) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(run_id = %self.run_id, turns = history.len(), state = %self.state, "Run cancelled");
            return Err(ParleyError::Cancelled {
                run_id: self.run_id,
                completed_turns: history.len(),
            });
        }
        Ok(())
    }

    async fn take_turn(&self, history: &mut ConversationHistory, role: Role) -> Result<()> {
        self.ensure_not_cancelled(history)?;

        let invoker = match role {
            Role::User => &self.user,
            Role::Expert => &self.expert,
        };
        let sequence_index = history.next_index();
        debug!(run_id = %self.run_id, turn = sequence_index, %role, "Invoking agent");

        let text = invoker
            .invoke(history)
            .await
            .map_err(|source| ParleyError::AgentCall {
                run_id: self.run_id,
                source,
            })?;

        let turn = Turn::new(role, text, sequence_index);
        history.append(turn.clone())?;
        debug!(
            run_id = %self.run_id,
            turn = sequence_index,
            %role,
            preview = %preview(turn.text()),
            "Appended turn"
        );
        self.emit(EngineEvent::TurnAppended {
            run_id: self.run_id,
            turn,
        });
        Ok(())
    }

    fn transition(&mut self, next: EngineState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ParleyError::State(format!(
                "illegal engine transition {} -> {next}",
                self.state
            )));
        }
        let from = std::mem::replace(&mut self.state, next);
        info!(run_id = %self.run_id, %from, to = %next, "Engine state changed");
        self.emit(EngineEvent::StateChanged {
            run_id: self.run_id,
            from,
            to: next,
        });
        Ok(())
    }

    fn force_failed(&mut self) {
        if self.state.can_transition_to(EngineState::Failed) {
            let _ = self.transition(EngineState::Failed);
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(ref sink) = self.event_sink {
            sink(event);
        }
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
