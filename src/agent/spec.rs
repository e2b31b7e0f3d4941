//! Agent persona configuration.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::conversation::Role;

/// Matches `${userAgentGoal}` and `${goal}`, whitespace tolerant.
fn goal_placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{\s*(?:userAgentGoal|goal)\s*\}").expect("valid placeholder regex")
    })
}

/// Persona and instructions for one side of the dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub description: String,
    /// May contain a `${userAgentGoal}` placeholder.
    pub instructions_template: String,
    pub role: Role,
}

impl AgentSpec {
    pub fn new(
        role: Role,
        name: impl Into<String>,
        description: impl Into<String>,
        instructions_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions_template: instructions_template.into(),
            role,
        }
    }

    /// Instructions with every goal placeholder replaced by `goal`.
    pub fn resolve_instructions(&self, goal: &str) -> String {
        goal_placeholder()
            .replace_all(&self.instructions_template, regex::NoExpand(goal))
            .into_owned()
    }

    pub fn has_goal_placeholder(&self) -> bool {
        goal_placeholder().is_match(&self.instructions_template)
    }
}
