pub mod traits;
pub mod openai;
pub mod ollama;
pub mod tokens;
pub mod error;

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use serde_json::Value as JsonValue;
use tokens::TokenUsage;

use crate::config::{LlmConfig, Provider};
use crate::config::ConfigError;
use traits::LLM;

/// Result of a text generation from an LLM.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GenerateResult {
    pub tokens: TokenUsage,
    pub generation: String,
    /// Structured tool calls the LLM signaled during this generation.
    /// Each entry contains the tool name and the arguments object the LLM wants
    /// the agent to pass when invoking that tool.
    #[serde(default)]
    pub tool_calls: Vec<CallInfo>,
}

/// Structured information about a single tool call requested by the LLM.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CallInfo {
    /// Provider-assigned call id, echoed back with the tool result.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: JsonValue,
}

impl CallInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: JsonValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// Result type for LLM operations.
pub type LLMResult<T> = std::result::Result<T, error::LLMError>;

/// Build the configured backend.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LLM>, ConfigError> {
    let options = openai::CompletionOptions {
        model: config.model().to_string(),
        temperature: Some(config.temperature),
    };
    match config.provider {
        Provider::OpenRouter => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingConfig("OPENROUTER_API_KEY".into()))?;
            let llm = openai::OpenAI::with_api_key(api_key)
                .with_api_base(config.base_url.clone())
                .with_options(options);
            Ok(traits::llm_to_arc_dyn(llm))
        }
        Provider::Ollama => {
            let client = ollama::OllamaClient::from_url(config.ollama_url()?);
            let llm = ollama::Ollama::new(Arc::new(client))
                .with_model(config.model())
                .with_options(ollama::ModelOptions::default().temperature(config.temperature));
            Ok(traits::llm_to_arc_dyn(llm))
        }
    }
}
