//! Test doubles shared by the agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::{FutureExt, future::BoxFuture};
use serde_json::Value;

use crate::llm::{error::LLMError, tokens::TokenUsage, traits::LLM, CallInfo, GenerateResult, LLMResult};
use crate::message::Message;
use crate::tools::{error::ToolError, schema::{ArgSchema, ToolSchema}, traits::Tool};

/// Replays canned generations in order and records every request.
pub(crate) struct ScriptedLLM {
    replies: Mutex<VecDeque<GenerateResult>>,
    pub(crate) seen: Mutex<Vec<(Vec<Message>, Vec<ToolSchema>)>>,
}

impl ScriptedLLM {
    pub(crate) fn new(replies: Vec<GenerateResult>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

pub(crate) fn text(generation: &str) -> GenerateResult {
    GenerateResult {
        tokens: TokenUsage::new(10, 5),
        generation: generation.to_string(),
        tool_calls: Vec::new(),
    }
}

pub(crate) fn tool_call(name: &str, args: Value) -> GenerateResult {
    GenerateResult {
        tokens: TokenUsage::new(10, 5),
        generation: String::new(),
        tool_calls: vec![CallInfo::new("call_0", name, args)],
    }
}

impl LLM for ScriptedLLM {
    fn generate<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolSchema],
    ) -> BoxFuture<'a, LLMResult<GenerateResult>> {
        self.seen.lock().unwrap().push((messages.to_vec(), tools.to_vec()));
        let reply = self.replies.lock().unwrap().pop_front();
        async move { reply.ok_or_else(|| LLMError::InvalidResponse("script exhausted".into())) }.boxed()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// `get_weather` stand-in that never touches the network.
pub(crate) struct FakeWeather;

#[async_trait::async_trait]
impl Tool for FakeWeather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Fetch real-time weather for a given city location."
    }

    fn args(&self) -> Vec<ArgSchema> {
        vec![ArgSchema {
            name: "location".into(),
            arg_type: "string".into(),
            description: "City name".into(),
            required: true,
        }]
    }

    async fn run(&self, input: Value) -> Result<String, ToolError> {
        let location = input
            .get("location")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::ParamsNotMatched("location".into()))?;
        Ok(format!("The current temperature in {location} is 18°C with light rain."))
    }
}
