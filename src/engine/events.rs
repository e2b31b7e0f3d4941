//! Progress events emitted while a run executes.

use std::sync::Arc;

use serde::Serialize;

use crate::conversation::Turn;

use super::state::EngineState;
use super::RunId;

/// Engine progress event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    StateChanged {
        run_id: RunId,
        from: EngineState,
        to: EngineState,
    },
    TurnAppended {
        run_id: RunId,
        turn: Turn,
    },
}

/// Callback receiving engine events, invoked inline on the run's task.
pub type EventSink = Arc<dyn Fn(EngineEvent) + Send + Sync>;
