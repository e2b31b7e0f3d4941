//! Dialogue state: roles, turns and the append-only history.

pub mod history;
pub mod turn;

pub use history::{ConversationHistory, TURN_SEPARATOR};
pub use turn::{Role, Turn};
