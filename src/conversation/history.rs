//! Append-only conversation log.

use tracing::debug;

use crate::error::{ParleyError, Result};

use super::turn::{Role, Turn};

/// Separator placed between rendered turns.
pub const TURN_SEPARATOR: &str = "\n\n";

/// Ordered dialogue log shared by the engine, the invokers and the extractor.
///
/// Turns alternate strictly, starting with [`Role::User`], and each turn's
/// `sequence_index` equals its position. An optional seed is opaque prior
/// context: it is rendered first and takes no part in alternation.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    seed: Option<String>,
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject prior context. Only allowed once, before the first append.
    pub fn seed(&mut self, text: impl Into<String>) -> Result<()> {
        if !self.turns.is_empty() {
            return Err(ParleyError::State(format!(
                "cannot seed history after {} turns were appended",
                self.turns.len()
            )));
        }
        if self.seed.is_some() {
            return Err(ParleyError::State("history is already seeded".into()));
        }
        let text = text.into();
        debug!(len = text.len(), "Seeded conversation history");
        self.seed = Some(text);
        Ok(())
    }

    /// Append the next turn, enforcing alternation and gapless indexing.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        let expected_index = self.turns.len();
        if turn.sequence_index() != expected_index {
            return Err(ParleyError::Sequence(format!(
                "expected sequence index {expected_index}, got {}",
                turn.sequence_index()
            )));
        }
        let expected_role = self.next_role();
        if turn.role() != expected_role {
            return Err(ParleyError::Sequence(format!(
                "expected {expected_role} turn at index {expected_index}, got {}",
                turn.role()
            )));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Role that must produce the next turn.
    pub fn next_role(&self) -> Role {
        self.turns
            .last()
            .map(|t| t.role().next())
            .unwrap_or(Role::User)
    }

    /// Sequence index the next turn must carry.
    pub fn next_index(&self) -> usize {
        self.turns.len()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn seed_text(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of role turns; the seed is not counted.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when there is neither a seed nor any turn.
    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.turns.is_empty()
    }

    /// Number of turns produced by `role`.
    pub fn count(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role() == role).count()
    }

    /// Deterministic transcript: the seed as-is, then `"<Role>: <text>"` per
    /// turn, blocks joined by a blank line.
    ///
    /// This exact text is persisted and fed to downstream prompts.
    pub fn render_as_text(&self) -> String {
        let mut blocks: Vec<String> = Vec::with_capacity(self.turns.len() + 1);
        if let Some(ref seed) = self.seed {
            blocks.push(seed.clone());
        }
        blocks.extend(self.turns.iter().map(Turn::render));
        blocks.join(TURN_SEPARATOR)
    }
}
