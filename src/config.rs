use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::agent::types::AgentMode;
use crate::llm::{ollama, openai};
use crate::tools::weather;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";

/// Service configuration. Every section falls back to its defaults, so an
/// empty TOML file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub weather: WeatherConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: "0.0.0.0:8000".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenRouter,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Falls back to the provider's default model.
    pub model: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub ollama_host: String,
    pub ollama_port: u16,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            base_url: openai::OPENROUTER_API_BASE.to_string(),
            api_key: None,
            temperature: 0.0,
            ollama_host: "http://localhost".to_string(),
            ollama_port: 11434,
        }
    }
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, Provider::OpenRouter) => openai::DEFAULT_MODEL,
            (None, Provider::Ollama) => ollama::DEFAULT_MODEL,
        }
    }

    /// `ollama_host` with `ollama_port` applied. The host needs an http(s) scheme.
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| {
            ConfigError::InvalidConfig(format!("llm.ollama_host '{}': {reason}", self.ollama_host))
        };
        let mut url = Url::parse(&self.ollama_host).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid("expected an http(s) URL such as http://localhost".into()));
        }
        url.set_port(Some(self.ollama_port))
            .map_err(|_| invalid("cannot carry a port".into()))?;
        Ok(url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    /// `metric`, `imperial` or `standard`.
    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: weather::DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub mode: AgentMode,
    pub max_iterations: usize,
    /// System prompt. In weather-only mode it is appended after the weather-only instruction.
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            max_iterations: 15,
            system_prompt: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read the TOML file at `path`, or start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    /// Fill API keys from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        if let Some(key) = non_empty(OPENROUTER_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = non_empty(OPENWEATHER_API_KEY) {
            self.weather.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.provider == Provider::OpenRouter && self.llm.api_key.is_none() {
            return Err(ConfigError::MissingConfig(OPENROUTER_API_KEY.into()));
        }
        if self.llm.provider == Provider::Ollama {
            self.llm.ollama_url()?;
        }
        if self.weather.api_key.is_none() {
            return Err(ConfigError::MissingConfig(OPENWEATHER_API_KEY.into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::InvalidConfig("agent.max_iterations must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidConfig(format!(
                "llm.temperature must be within 0..=2, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}
