//! Agents: persona specs, prompt text, and the invokers that speak for each role.

pub mod invoker;
pub mod prompts;
pub mod spec;

pub use invoker::{AgentInvoker, LlmAgent};
pub use spec::AgentSpec;
