//! ReAct agent on a local Ollama model with the real weather tool.
//!
//! ```bash
//! OPENWEATHER_API_KEY=... cargo run --example local_agent -- "Is it raining in Dublin?"
//! ```
use std::sync::Arc;

use weather_agent::{
    agent::{traits::AgentRunner, types::{Agent, AgentMode}},
    llm::{ollama::Ollama, traits::LLM},
    tools::weather::{WeatherClient, WeatherTool},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    // Adjust model name to one available in your Ollama server.
    let llm: Arc<dyn LLM> = Arc::new(Ollama::default().with_model("qwen3:8b"));
    let weather = WeatherClient::new(std::env::var("OPENWEATHER_API_KEY")?);

    let mut agent = Agent::new("local-react", llm, Some(5)).with_mode(AgentMode::React);
    agent.register_tool(None, Arc::new(WeatherTool::new(weather)));

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What's the weather in Beijing?".to_string());

    let res = agent.invoke(&question).await?;
    println!("{}", res.generation);
    println!(
        "tokens: prompt={} completion={} total={}",
        res.tokens.prompt_tokens, res.tokens.completion_tokens, res.tokens.total_tokens
    );
    Ok(())
}
