//! Token usage tracking.

use serde::{Deserialize, Serialize};

/// Token usage reported for one or more completions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
