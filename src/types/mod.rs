//! Shared request/response value types.

pub mod generation;
pub mod usage;

pub use generation::*;
pub use usage::*;
