
use std::sync::Arc;
use serde_json::{json, Value};
use futures::{
    FutureExt,
    future::BoxFuture,
};
use tracing::debug;

use crate::message::Message;
use crate::message::MessageRole as MsgRole;
use crate::tools::schema::ToolSchema;

use crate::llm::{
    traits::LLM,
    tokens::TokenUsage,
    CallInfo,
    GenerateResult,
    LLMResult,
};

/// Default model name used when no model is specified.
/// Adjust this to match the model name you have installed in your local Ollama.
pub const DEFAULT_MODEL: &str = "llama3.2";

pub use ollama_rs::{
    error::OllamaError,
    Ollama as OllamaClient,
    models::ModelOptions,
    generation::chat::{request::ChatMessageRequest, ChatMessage, MessageRole},
};


#[derive(Debug, Clone)]
pub struct Ollama {
    pub(crate) client: Arc<OllamaClient>,
    pub(crate) model: String,
    pub(crate) options: Option<ModelOptions>,
}
impl Ollama {
    /// Create an `Ollama` wrapper using the provided client and the default model.
    pub fn new(client: Arc<OllamaClient>) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            options: None,
        }
    }

    /// Use an explicit model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Additional generation options.
    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }

    fn generate_request(&self, messages: &[Message], tools: &[ToolSchema]) -> ChatMessageRequest {
        let mut mapped: Vec<ChatMessage> = tools_prompt(tools).iter().map(ChatMessage::from).collect();
        mapped.extend(messages.iter().map(ChatMessage::from));
        let request = ChatMessageRequest::new(self.model.clone(), mapped);
        match self.options.clone() {
            Some(options) => request.options(options),
            None => request,
        }
    }

    async fn chat(&self, messages: &[Message], tools: &[ToolSchema]) -> LLMResult<GenerateResult> {
        let request = self.generate_request(messages, tools);
        debug!(model = %self.model, tools = tools.len(), "sending ollama chat");
        let response = self.client.send_chat_messages(request).await?;
        let generation = response.message.content;

        let tokens = response
            .final_data
            .map(|final_data| {
                TokenUsage::new(final_data.prompt_eval_count as u32, final_data.eval_count as u32)
            })
            .unwrap_or_default();

        let tool_calls = if tools.is_empty() {
            Vec::new()
        } else {
            parse_tool_calls(&generation)
        };

        Ok(GenerateResult { tokens, generation, tool_calls })
    }
}

impl Default for Ollama {
    fn default() -> Self {
        let client = Arc::new(OllamaClient::default());
        Ollama::new(client)
    }
}


impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            MsgRole::System | MsgRole::Developer => MessageRole::System,
            MsgRole::User => MessageRole::User,
            MsgRole::Assistant => MessageRole::Assistant,
            MsgRole::Tool => MessageRole::Tool,
        };
        ChatMessage::new(role, message.content.clone())
    }
}

/// Ollama gets no native tool binding here: the tools are described in
/// system messages and the model answers with a `tool_calls` JSON block.
fn tools_prompt(tools: &[ToolSchema]) -> Vec<Message> {
    if tools.is_empty() {
        return Vec::new();
    }
    let mut msgs = vec![Message::developer(format!(
        "I also provide some tools for you to choose from. If you want to call a tool, \
         reply with only the following JSON: {}",
        json!({
            "tool_calls": [
                { "name": "tool_name", "args": { "param1": "value1" } }
            ]
        })
    ))];
    msgs.extend(tools.iter().map(|schema| {
        Message::system(json!({
            "name": schema.name,
            "description": schema.description,
            "parameters": schema.parameters(),
        }).to_string())
    }));
    msgs
}

/// Extract `tool_calls: [{name, args}]` from generation text. Tries the whole
/// text first, then the outermost `{...}` substring.
pub(crate) fn parse_tool_calls(generation: &str) -> Vec<CallInfo> {
    let parsed = serde_json::from_str::<Value>(generation).ok().or_else(|| {
        let start = generation.find('{')?;
        let end = generation.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<Value>(&generation[start..=end]).ok()
    });

    let Some(entries) = parsed
        .as_ref()
        .and_then(|v| v.get("tool_calls"))
        .and_then(|v| v.as_array())
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let args = entry.get("args").cloned().unwrap_or_else(|| json!({}));
            Some((name.to_string(), args))
        })
        .enumerate()
        .map(|(i, (name, args))| CallInfo::new(format!("call_{i}"), name, args))
        .collect()
}


impl LLM for Ollama {
    fn generate<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolSchema],
    ) -> BoxFuture<'a, LLMResult<GenerateResult>> {
        self.chat(messages, tools).boxed()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::ArgSchema;
    use mockito::Matcher;

    const TOOL_CALL_REPLY: &str = r#"{"tool_calls":[{"name":"get_weather","args":{"location":"Oslo"}}]}"#;

    fn client_for(server: &mockito::ServerGuard) -> Ollama {
        let url = reqwest::Url::parse(&server.url()).unwrap();
        Ollama::new(Arc::new(OllamaClient::from_url(url))).with_model("llama-test")
    }

    fn chat_body(content: &str) -> String {
        json!({
            "model": "llama-test",
            "created_at": "2024-05-01T10:00:00Z",
            "message": { "role": "assistant", "content": content },
            "done": true,
            "total_duration": 1200,
            "load_duration": 100,
            "prompt_eval_count": 42,
            "prompt_eval_duration": 300,
            "eval_count": 7,
            "eval_duration": 800
        })
        .to_string()
    }

    fn weather_schema() -> ToolSchema {
        ToolSchema {
            name: "get_weather".into(),
            description: "Fetch real-time weather".into(),
            args: vec![ArgSchema {
                name: "location".into(),
                arg_type: "string".into(),
                description: "City name".into(),
                required: true,
            }],
        }
    }

    #[tokio::test]
    async fn chat_puts_tool_prompt_first_and_extracts_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "model": "llama-test", "stream": false })),
                Matcher::Regex(r#""messages":\[\{"role":"system","content":"I also provide some tools"#.into()),
                Matcher::Regex(r#"\{"role":"user","content":"Weather in Oslo\?""#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body(TOOL_CALL_REPLY))
            .create_async()
            .await;

        let res = client_for(&server)
            .generate(&[Message::user("Weather in Oslo?")], &[weather_schema()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(res.tokens, TokenUsage::new(42, 7));
        assert_eq!(
            res.tool_calls,
            vec![CallInfo::new("call_0", "get_weather", json!({ "location": "Oslo" }))]
        );
    }

    #[tokio::test]
    async fn chat_without_tools_sends_messages_as_is() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::Regex(r#""messages":\[\{"role":"user","content":"hi""#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body(TOOL_CALL_REPLY))
            .create_async()
            .await;

        let res = client_for(&server).generate(&[Message::user("hi")], &[]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(res.generation, TOOL_CALL_REPLY);
        assert!(res.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn server_errors_surface_as_ollama_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(404)
            .with_body(r#"{"error":"model 'llama-test' not found"}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, crate::llm::error::LLMError::OllamaError(_)));
    }

    #[test]
    fn parses_bare_json() {
        let calls = parse_tool_calls(r#"{"tool_calls":[{"name":"get_weather","args":{"location":"Oslo"}}]}"#);
        assert_eq!(calls, vec![CallInfo::new("call_0", "get_weather", json!({ "location": "Oslo" }))]);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let text = "Sure, let me check.\n```json\n{\"tool_calls\": [{\"name\": \"get_weather\"}]}\n```";
        let calls = parse_tool_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].args, json!({}));
    }

    #[test]
    fn plain_text_has_no_calls() {
        assert!(parse_tool_calls("It is 21°C and cloudy in Oslo.").is_empty());
        assert!(parse_tool_calls("} stray braces {").is_empty());
    }

    #[test]
    fn tools_are_described_in_system_messages() {
        let schema = ToolSchema {
            name: "get_weather".into(),
            description: "weather".into(),
            args: vec![],
        };
        let msgs = tools_prompt(&[schema]);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, MsgRole::Developer);
        assert!(msgs[1].content.contains("\"get_weather\""));
        assert!(tools_prompt(&[]).is_empty());
    }
}
