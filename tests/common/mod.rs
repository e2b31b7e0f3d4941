//! Shared test helpers: scripted invokers, a recording provider, an in-memory sink.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parley::agent::AgentSpec;
use parley::config::RunConfig;
use parley::conversation::{ConversationHistory, Role};
use parley::engine::TakeawayExtractor;
use parley::error::{AgentCallError, ParleyError, ProviderError};
use parley::output::OutputSink;
use parley::provider::{CompletionRequest, CompletionResponse, ModelProvider};
use parley::types::{FinishReason, GenerationSettings, Usage};

/// Invoker that replays a fixed script of replies or failures.
pub struct ScriptedInvoker {
    role: Role,
    name: String,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn new(role: Role, replies: &[&str]) -> Self {
        Self {
            role,
            name: format!("scripted-{role}"),
            script: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure after the replies already scripted.
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Rendered history passed to each invocation.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl parley::agent::AgentInvoker for ScriptedInvoker {
    fn role(&self) -> Role {
        self.role
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, history: &ConversationHistory) -> Result<String, AgentCallError> {
        self.seen.lock().unwrap().push(history.render_as_text());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("{} script exhausted", self.name));
        next.map_err(|e| AgentCallError::turn(self.role, history.next_index(), e))
    }
}

/// Provider that records every request and answers from a queue.
pub struct CaptureProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl CaptureProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
    }

    pub fn queue_error(&self, error: ProviderError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for CaptureProvider {
    fn provider_name(&self) -> &str {
        "capture"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()));
        next.map(|text| CompletionResponse {
            text,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            finish_reason: Some(FinishReason::Stop),
        })
    }
}

/// Sink that keeps artifacts in memory.
#[derive(Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn artifacts(&self) -> Vec<(String, String)> {
        self.artifacts.lock().unwrap().clone()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.artifacts()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }
}

impl OutputSink for MemorySink {
    fn write_artifact(&self, file_name: &str, contents: &str) -> parley::error::Result<PathBuf> {
        self.artifacts
            .lock()
            .unwrap()
            .push((file_name.to_string(), contents.to_string()));
        Ok(PathBuf::from(file_name))
    }
}

/// Sink whose every write fails like a full disk.
pub struct FailingSink;

impl OutputSink for FailingSink {
    fn write_artifact(&self, file_name: &str, _contents: &str) -> parley::error::Result<PathBuf> {
        Err(ParleyError::Output {
            path: PathBuf::from(file_name),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }
}

pub fn run_config(goal: &str, max_iterations: i64) -> RunConfig {
    RunConfig {
        goal: goal.to_string(),
        user_agent_spec: AgentSpec::new(
            Role::User,
            "Researcher",
            "asks questions",
            "Pursue ${userAgentGoal}.",
        ),
        expert_agent_spec: AgentSpec::new(Role::Expert, "Expert", "a seasoned expert", "Y"),
        max_iterations,
        seed_history: None,
        model_id: "test-model".to_string(),
        settings: GenerationSettings::default(),
    }
}

pub fn extractor(config: &RunConfig, provider: Arc<CaptureProvider>) -> TakeawayExtractor {
    TakeawayExtractor::new(
        provider,
        config.model_id.clone(),
        config.goal.clone(),
        &config.expert_agent_spec,
    )
}
