//! Turn and role types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Speaker of a turn.
///
/// The `Display` form is the label used in transcripts (`User: ...`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Expert,
}

impl Role {
    /// The role expected to speak after this one.
    pub fn next(self) -> Self {
        match self {
            Self::User => Self::Expert,
            Self::Expert => Self::User,
        }
    }
}

/// One utterance in the dialogue. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    role: Role,
    text: String,
    sequence_index: usize,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>, sequence_index: usize) -> Self {
        Self {
            role,
            text: text.into(),
            sequence_index,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// `"<RoleLabel>: <text>"`
    pub fn render(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}
