use std::sync::Arc;
use crate::config::AgentConfig;
use crate::llm::traits::LLM;
use crate::tools::{
    traits::Tool,
    schema::ToolSchema,
    weather::{WeatherClient, WeatherTool},
};
use tracing::info;


pub mod types;
pub mod error;
pub mod traits;
pub mod react;
pub mod tool_calling;
pub mod weather_only;
#[cfg(test)]
pub(crate) mod testing;

use traits::AgentRunner;
use types::{Agent, AgentMode, AgentExecuteResult};


impl Agent {
    /// Create a new Agent with the provided name and LLM. Tools start empty.
    pub fn new(name: impl Into<String>, llm: Arc<dyn LLM>, max_iterations: Option<usize>) -> Self {
        Self {
            name: name.into(),
            llm,
            tools: Default::default(),
            system_prompt: None,
            max_iterations: max_iterations.unwrap_or(react::DEFAULT_MAX_ITERATIONS),
            mode: AgentMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the agent a config section describes, with the weather tool
    /// registered. Air quality is only reported in weather-only mode, where
    /// the weather-only instruction always leads the system prompt.
    pub fn from_config(config: &AgentConfig, llm: Arc<dyn LLM>, weather: WeatherClient) -> Self {
        let name = format!("{}/{}", config.mode, llm.model_name());
        let mut agent = Agent::new(name, llm, Some(config.max_iterations)).with_mode(config.mode);

        let restricted = config.mode == AgentMode::WeatherOnly;
        agent.register_tool(None, Arc::new(WeatherTool::new(weather).with_air_quality(restricted)));

        let prompt = match (restricted, config.system_prompt.as_deref()) {
            (true, Some(extra)) => Some(format!("{}\n\n{extra}", weather_only::WEATHER_ONLY_INSTRUCTION)),
            (true, None) => Some(weather_only::WEATHER_ONLY_INSTRUCTION.to_string()),
            (false, extra) => extra.map(str::to_string),
        };
        if let Some(prompt) = prompt {
            agent.set_system_prompt(prompt);
        }
        info!(agent = %agent.name, tools = agent.tools.len(), "agent ready");
        agent
    }

    /// Register a tool under the given name. Replaces any existing tool with the same name. Returns &mut Self for chaining.
    pub fn register_tool(&mut self, name: Option<&str>, tool: Arc<dyn Tool>) -> &mut Self {
        // If no name is provided, use the tool's own name.
        let name = name.unwrap_or_else(|| tool.name()).to_string();
        self.tools.insert(name, tool);
        self
    }

    /// Change the maximum iterations for the agent's decision process.
    pub fn change_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    /// Look up a tool by name.
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Set or replace the agent's system prompt.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    /// Schemas of every registered tool, under their registered names.
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|(name, tool)| ToolSchema {
                name: name.clone(),
                ..tool.schema()
            })
            .collect()
    }
}


#[async_trait::async_trait]
impl AgentRunner for Agent {
    async fn invoke(&self, input: &str) -> AgentExecuteResult {
        match self.mode {
            AgentMode::React => react::run(self, input).await,
            AgentMode::ToolCalling | AgentMode::WeatherOnly => tool_calling::run(self, input).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use testing::{FakeWeather, ScriptedLLM, text};

    #[test]
    fn registered_name_overrides_tool_name() {
        let mut agent = Agent::new("t", Arc::new(ScriptedLLM::new(vec![])), None);
        agent.register_tool(Some("weather"), Arc::new(FakeWeather));
        assert!(agent.get_tool("weather").is_some());
        assert!(agent.get_tool("get_weather").is_none());
        assert_eq!(agent.tool_schemas()[0].name, "weather");
        assert_eq!(agent.max_iterations, react::DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn from_config_installs_weather_only_prompt() {
        let config = AgentConfig::default();
        let agent = Agent::from_config(&config, Arc::new(ScriptedLLM::new(vec![])), WeatherClient::new("k"));
        assert_eq!(agent.mode, AgentMode::WeatherOnly);
        assert_eq!(agent.system_prompt.as_deref(), Some(weather_only::WEATHER_ONLY_INSTRUCTION));
        assert_eq!(agent.tool_schemas()[0].name, "get_weather");
        assert_eq!(agent.name, "weather-only/scripted");
    }

    #[test]
    fn weather_only_keeps_instruction_under_custom_prompt() {
        let config = AgentConfig {
            system_prompt: Some("You are a helpful assistant.".into()),
            ..AgentConfig::default()
        };
        let agent = Agent::from_config(&config, Arc::new(ScriptedLLM::new(vec![])), WeatherClient::new("k"));
        let prompt = agent.system_prompt.as_deref().unwrap();
        assert!(prompt.starts_with(weather_only::WEATHER_ONLY_INSTRUCTION));
        assert!(prompt.ends_with("\n\nYou are a helpful assistant."));
    }

    #[test]
    fn from_config_respects_custom_prompt_and_mode() {
        let config = AgentConfig {
            mode: AgentMode::React,
            max_iterations: 3,
            system_prompt: Some("Be brief.".into()),
        };
        let agent = Agent::from_config(&config, Arc::new(ScriptedLLM::new(vec![])), WeatherClient::new("k"));
        assert_eq!(agent.max_iterations, 3);
        assert_eq!(agent.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(agent.mode, AgentMode::React);
    }

    #[tokio::test]
    async fn invoke_dispatches_on_mode() {
        let llm = Arc::new(ScriptedLLM::new(vec![text("Thought: easy\nFinal Answer: hello")]));
        let agent = Agent::new("t", llm.clone(), None).with_mode(AgentMode::React);
        let res = agent.invoke("say hello").await.unwrap();
        assert_eq!(res.generation, "hello");
        // ReAct sends no native tools.
        assert!(llm.seen.lock().unwrap()[0].1.is_empty());
    }
}
