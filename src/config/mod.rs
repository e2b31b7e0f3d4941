//! Run configuration (layered: config file > environment / `.env`).
//!
//! The file is JSON, YAML or TOML, chosen by extension, with camelCase keys:
//!
//! ```yaml
//! userAgentGoal: Understand how sourdough starters work
//! expertAgentPersona: You are a master baker with 30 years of experience.
//! maxIterations: 3
//! openaiModel: gpt-4.1-mini
//! outputDir: ./output
//! historyFilePath: ./notes/prior.txt   # optional seed context
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::prompts::{DEFAULT_EXPERT_NAME, DEFAULT_USER_INSTRUCTIONS, DEFAULT_USER_NAME};
use crate::agent::AgentSpec;
use crate::conversation::Role;
use crate::error::{ParleyError, Result};
use crate::provider::openai::{OpenAiProvider, DEFAULT_TIMEOUT};
use crate::types::GenerationSettings;
use crate::util::retry::RetryPolicy;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            other => Err(ParleyError::config(format!(
                "unsupported config file format {:?}; use .json, .yaml or .toml",
                other.unwrap_or("")
            ))),
        }
    }
}

/// Full persona override for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRoleConfig {
    pub name: String,
    pub description: String,
    pub instructions: String,
}

/// Configuration file contents.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub user_agent_goal: String,
    pub expert_agent_persona: String,
    pub max_iterations: i64,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub history_file_path: Option<PathBuf>,
    #[serde(default)]
    pub user_agent_config: Option<AgentRoleConfig>,
    #[serde(default)]
    pub expert_agent_config: Option<AgentRoleConfig>,
    #[serde(default)]
    pub openai_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("user_agent_goal", &self.user_agent_goal)
            .field("max_iterations", &self.max_iterations)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| ".."))
            .field("openai_model", &self.openai_model)
            .field("output_dir", &self.output_dir)
            .field("history_file_path", &self.history_file_path)
            .field("user_agent_config", &self.user_agent_config.as_ref().map(|c| &c.name))
            .field("expert_agent_config", &self.expert_agent_config.as_ref().map(|c| &c.name))
            .finish_non_exhaustive()
    }
}

/// Immutable inputs of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub goal: String,
    pub user_agent_spec: AgentSpec,
    pub expert_agent_spec: AgentSpec,
    pub max_iterations: i64,
    pub seed_history: Option<String>,
    pub model_id: String,
    pub settings: GenerationSettings,
}

impl AppConfig {
    /// Load and validate a config file. `.env` is read first if present.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ParleyError::config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ParleyError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::parse(&contents, format)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse without validating.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self> {
        let parsed = match format {
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| ParleyError::config(format!("invalid configuration: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("userAgentGoal", &self.user_agent_goal)?;
        require_non_blank("expertAgentPersona", &self.expert_agent_persona)?;
        require_non_blank("openaiModel", &self.openai_model)?;
        if self.max_iterations <= 0 {
            return Err(ParleyError::config(format!(
                "maxIterations must be a positive integer, got {}",
                self.max_iterations
            )));
        }
        if u32::try_from(self.max_iterations).is_err() {
            return Err(ParleyError::config(format!(
                "maxIterations {} is out of range (at most {})",
                self.max_iterations,
                u32::MAX
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(ParleyError::config("maxTokens must be positive when set"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ParleyError::config("outputDir must not be empty"));
        }
        if let Some(ref path) = self.history_file_path {
            if !path.exists() {
                return Err(ParleyError::config(format!(
                    "history file path does not exist: {}",
                    path.display()
                )));
            }
            if !path.is_file() {
                return Err(ParleyError::config(format!(
                    "history file path is not a file: {}",
                    path.display()
                )));
            }
        }
        for (key, agent) in [
            ("userAgentConfig", &self.user_agent_config),
            ("expertAgentConfig", &self.expert_agent_config),
        ] {
            if let Some(agent) = agent {
                require_non_blank(&format!("{key}.name"), &agent.name)?;
                require_non_blank(&format!("{key}.instructions"), &agent.instructions)?;
            }
        }
        Ok(())
    }

    /// Apply a command-line iteration override; non-positive values are ignored.
    pub fn override_max_iterations(&mut self, value: Option<i64>) {
        match value {
            Some(n) if n > 0 => {
                info!(max_iterations = n, "Overriding maxIterations from the command line");
                self.max_iterations = n;
            }
            Some(n) => warn!(
                value = n,
                configured = self.max_iterations,
                "Ignoring non-positive --max-iterations; using configured value"
            ),
            None => {}
        }
    }

    /// API key from the config file, falling back to `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.openai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                ParleyError::config(format!(
                    "OpenAI API key is required; set openaiApiKey or {API_KEY_ENV}"
                ))
            })
    }

    /// Endpoint override from the config file, falling back to `OPENAI_BASE_URL`.
    pub fn resolve_base_url(&self) -> Option<String> {
        self.openai_base_url
            .clone()
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .filter(|u| !u.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.max_retries.unwrap_or(0))
    }

    pub fn build_provider(&self) -> Result<OpenAiProvider> {
        Ok(OpenAiProvider::new(self.resolve_api_key()?, self.resolve_base_url())
            .with_timeout(self.request_timeout())
            .with_retry_policy(self.retry_policy()))
    }

    /// User agent persona: the custom config if present, else the built-in researcher.
    pub fn user_agent_spec(&self) -> AgentSpec {
        match self.user_agent_config {
            Some(ref c) => AgentSpec::new(Role::User, &c.name, &c.description, &c.instructions),
            None => AgentSpec::new(
                Role::User,
                DEFAULT_USER_NAME,
                format!("Researcher pursuing: {}", self.user_agent_goal),
                DEFAULT_USER_INSTRUCTIONS,
            ),
        }
    }

    /// Expert agent persona: the custom config if present, else `expertAgentPersona`.
    pub fn expert_agent_spec(&self) -> AgentSpec {
        match self.expert_agent_config {
            Some(ref c) => AgentSpec::new(Role::Expert, &c.name, &c.description, &c.instructions),
            None => AgentSpec::new(
                Role::Expert,
                DEFAULT_EXPERT_NAME,
                &self.expert_agent_persona,
                &self.expert_agent_persona,
            ),
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Resolve everything a run needs, reading the seed file if configured.
    pub fn run_config(&self) -> Result<RunConfig> {
        let seed_history = match self.history_file_path {
            Some(ref path) => load_seed(path)?,
            None => None,
        };
        let user_agent_spec = self.user_agent_spec();
        if !user_agent_spec.has_goal_placeholder() {
            warn!(
                agent = %user_agent_spec.name,
                "User agent instructions have no ${{userAgentGoal}} placeholder; the goal reaches it only through the turn prompt"
            );
        }
        Ok(RunConfig {
            goal: self.user_agent_goal.clone(),
            user_agent_spec,
            expert_agent_spec: self.expert_agent_spec(),
            max_iterations: self.max_iterations,
            seed_history,
            model_id: self.openai_model.clone(),
            settings: self.generation_settings(),
        })
    }
}

/// Read a seed history file verbatim. Blank files yield no seed.
pub fn load_seed(path: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ParleyError::config(format!("cannot read history file {}: {e}", path.display()))
    })?;
    if text.trim().is_empty() {
        warn!(path = %path.display(), "History file is empty; starting without seed");
        return Ok(None);
    }
    info!(path = %path.display(), len = text.len(), "Loaded seed history");
    Ok(Some(text))
}

fn require_non_blank(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ParleyError::config(format!("{key} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "\
userAgentGoal: Learn about tides
expertAgentPersona: You are an oceanographer.
maxIterations: 2
openaiModel: gpt-4.1-mini
outputDir: out
";

    fn yaml_config() -> AppConfig {
        AppConfig::parse(YAML, ConfigFormat::Yaml).unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")).unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")).unwrap(), ConfigFormat::Toml);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("a.ini")),
            Err(ParleyError::Config(_))
        ));
    }

    #[test]
    fn parses_camel_case_yaml() {
        let config = yaml_config();
        assert_eq!(config.user_agent_goal, "Learn about tides");
        assert_eq!(config.max_iterations, 2);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.history_file_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_required_field_is_config_error() {
        let err = AppConfig::parse("userAgentGoal: x\n", ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)), "{err}");
    }

    #[test]
    fn non_positive_iterations_fail_validation() {
        for n in [0, -3] {
            let mut config = yaml_config();
            config.max_iterations = n;
            assert!(matches!(config.validate(), Err(ParleyError::Config(_))));
        }
    }

    #[test]
    fn zero_max_tokens_fails_validation() {
        let mut config = yaml_config();
        config.max_tokens = Some(0);
        assert!(matches!(config.validate(), Err(ParleyError::Config(_))));
        config.max_tokens = Some(64);
        assert!(config.validate().is_ok());
        assert_eq!(config.generation_settings().max_tokens, Some(64));
    }

    #[test]
    fn oversized_iterations_are_out_of_range() {
        let mut config = yaml_config();
        config.max_iterations = i64::from(u32::MAX) + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn override_ignores_non_positive_values() {
        let mut config = yaml_config();
        config.override_max_iterations(Some(0));
        assert_eq!(config.max_iterations, 2);
        config.override_max_iterations(Some(5));
        assert_eq!(config.max_iterations, 5);
        config.override_max_iterations(None);
        assert_eq!(config.max_iterations, 5);
    }

    #[test]
    fn default_specs_use_goal_and_persona() {
        let config = yaml_config();
        let user = config.user_agent_spec();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.name, DEFAULT_USER_NAME);
        assert!(user.resolve_instructions(&config.user_agent_goal).contains("Learn about tides"));

        let expert = config.expert_agent_spec();
        assert_eq!(expert.role, Role::Expert);
        assert_eq!(expert.instructions_template, "You are an oceanographer.");
    }

    #[test]
    fn custom_agent_configs_override_personas() {
        let mut config = yaml_config();
        config.user_agent_config = Some(AgentRoleConfig {
            name: "Student".into(),
            description: "curious".into(),
            instructions: "Study ${userAgentGoal} carefully.".into(),
        });
        config.expert_agent_config = Some(AgentRoleConfig {
            name: "Professor".into(),
            description: "tenured oceanographer".into(),
            instructions: "Lecture precisely.".into(),
        });

        let run = config.run_config().unwrap();
        assert_eq!(run.user_agent_spec.name, "Student");
        assert_eq!(
            run.user_agent_spec.resolve_instructions(&run.goal),
            "Study Learn about tides carefully."
        );
        assert_eq!(run.expert_agent_spec.name, "Professor");
        assert_eq!(run.expert_agent_spec.description, "tenured oceanographer");
    }

    #[test]
    fn blank_custom_instructions_fail_validation() {
        let mut config = yaml_config();
        config.expert_agent_config = Some(AgentRoleConfig {
            name: "Professor".into(),
            description: String::new(),
            instructions: "  ".into(),
        });
        assert!(matches!(config.validate(), Err(ParleyError::Config(_))));
    }

    #[test]
    fn explicit_api_key_wins() {
        let mut config = yaml_config();
        config.openai_api_key = Some("sk-from-file".into());
        assert_eq!(config.resolve_api_key().unwrap(), "sk-from-file");
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = yaml_config();
        config.openai_api_key = Some("sk-secret".into());
        let text = format!("{config:?}");
        assert!(!text.contains("sk-secret"));
    }

    #[test]
    fn timeout_and_retry_defaults() {
        let config = yaml_config();
        assert_eq!(config.request_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.retry_policy().max_attempts, 1);
    }
}
