//! Utility modules: retry and timeout around provider calls.

pub mod retry;
pub mod timeout;
