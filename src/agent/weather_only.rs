//! Weather-only assistant: tool calling under a fixed domain instruction.

use std::sync::Arc;

use super::types::{Agent, AgentMode};
use crate::llm::traits::LLM;
use crate::tools::weather::{WeatherClient, WeatherTool};

pub const WEATHER_ONLY_INSTRUCTION: &str = "You are a weather assistant. \
You only answer questions about current weather and air quality. \
For any question about a specific city, call the get_weather tool with the city name instead of guessing. \
If the user asks about anything other than weather or air quality, politely decline and explain \
that you can only help with weather questions.";

impl Agent {
    /// Tool-calling agent bound to `get_weather` (with air quality) that
    /// declines non-weather questions.
    pub fn weather_only(llm: Arc<dyn LLM>, weather: WeatherClient) -> Self {
        let mut agent = Agent::new("weather-only", llm, None).with_mode(AgentMode::WeatherOnly);
        agent.register_tool(None, Arc::new(WeatherTool::new(weather).with_air_quality(true)));
        agent.set_system_prompt(WEATHER_ONLY_INSTRUCTION);
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{ScriptedLLM, text, tool_call};
    use crate::agent::traits::AgentRunner;
    use crate::message::MessageRole;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn off_topic_questions_get_the_model_reply() {
        let llm = Arc::new(ScriptedLLM::new(vec![text(
            "Sorry, I can only help with weather questions.",
        )]));
        let agent = Agent::weather_only(llm.clone(), WeatherClient::new("unused"));
        let res = agent.invoke("Write me a poem").await.unwrap();
        assert_eq!(res.generation, "Sorry, I can only help with weather questions.");

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].0[0].role, MessageRole::System);
        assert_eq!(seen[0].0[0].content, WEATHER_ONLY_INSTRUCTION);
    }

    #[tokio::test]
    async fn weather_reply_includes_air_quality() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "coord": { "lon": 77.21, "lat": 28.61 },
                    "weather": [{ "description": "haze" }],
                    "main": { "temp": 31.0 },
                    "name": "Delhi"
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/data/2.5/air_pollution")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "list": [{ "main": { "aqi": 5 }, "components": {} }] }).to_string())
            .create_async()
            .await;

        let llm = Arc::new(ScriptedLLM::new(vec![tool_call("get_weather", json!({ "location": "Delhi" }))]));
        let agent = Agent::weather_only(llm, WeatherClient::new("k").with_base_url(server.url()));
        let res = agent.invoke("How is the air in Delhi?").await.unwrap();
        assert_eq!(
            res.generation,
            "The current temperature in Delhi is 31°C with haze. \
             Air quality: Very Poor (index 5/5, approx. AQI 250)."
        );
    }
}
