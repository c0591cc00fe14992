use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Deserialize};

use super::error::AgentError;
use crate::llm::tokens::TokenUsage;
use crate::llm::traits::LLM;
use crate::tools::traits::Tool;

/// Which decision strategy the agent runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentMode {
    /// Text-based Thought / Action / Observation loop.
    React,
    /// The model decides, through native tool binding, whether to call a tool.
    ToolCalling,
    /// Tool calling restricted to weather questions, with air quality.
    #[default]
    WeatherOnly,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::React => "react",
            AgentMode::ToolCalling => "tool-calling",
            AgentMode::WeatherOnly => "weather-only",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "react" => Ok(AgentMode::React),
            "tool-calling" | "tool_calling" => Ok(AgentMode::ToolCalling),
            "weather-only" | "weather_only" => Ok(AgentMode::WeatherOnly),
            other => Err(format!(
                "unknown agent mode '{other}', expected one of: react, tool-calling, weather-only"
            )),
        }
    }
}

/// High-level agent that holds an LLM and a set of tools.
pub struct Agent {
    /// A short, human-friendly name for the agent instance.
    pub name: String,

    /// The LLM implementation used to generate responses/thoughts.
    pub llm: Arc<dyn LLM>,

    /// Registered tools the agent may call by name. Ordered so prompts are stable.
    pub tools: BTreeMap<String, Arc<dyn Tool>>,

    /// Optional system prompt / instructions provided to the LLM.
    pub system_prompt: Option<String>,

    /// Maximum model calls in the ReAct loop.
    pub max_iterations: usize,

    pub mode: AgentMode,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AgentResult {
    pub tokens: TokenUsage,
    pub generation: String,
    /// Name of the tool whose output fed the answer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
}

pub type AgentExecuteResult = Result<AgentResult, AgentError>;
