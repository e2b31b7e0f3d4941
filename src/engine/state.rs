//! Engine lifecycle states.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Lifecycle of a single conversation run.
///
/// `Idle → Seeding → Running → Extracting → Done`, with `Failed` reachable
/// from every non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineState {
    Idle,
    Seeding,
    Running,
    Extracting,
    Done,
    Failed,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        match (self, next) {
            (Idle, Seeding) | (Seeding, Running) | (Running, Extracting) | (Extracting, Done) => {
                true
            }
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}
