// OpenAI-compatible chat completions (OpenRouter by default).
pub use async_openai::{Client, config::OpenAIConfig};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
};
use serde::{Serialize, Deserialize};
use serde_json::Value;
use futures::{FutureExt, future::BoxFuture};
use tracing::debug;

use crate::message::{Message, MessageRole};
use crate::tools::schema::ToolSchema;
use crate::llm::{
    traits::LLM,
    tokens::TokenUsage,
    error::LLMError,
    CallInfo,
    GenerateResult,
    LLMResult,
};

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-flash-1.5";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(0.0),
        }
    }
}

pub struct OpenAI {
    pub client: Client<OpenAIConfig>,
    pub options: CompletionOptions,
    config: OpenAIConfig,
}

impl OpenAI {
    pub fn new() -> Self {
        Self::from_config(OpenAIConfig::new())
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::from_config(OpenAIConfig::new().with_api_key(api_key))
    }

    /// Client pointed at OpenRouter.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::with_api_key(api_key).with_api_base(OPENROUTER_API_BASE)
    }

    pub fn with_api_base(self, api_base: impl Into<String>) -> Self {
        let config = self.config.with_api_base(api_base);
        Self {
            client: Client::with_config(config.clone()),
            options: self.options,
            config,
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    fn from_config(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config.clone()),
            options: CompletionOptions::default(),
            config,
        }
    }

    fn convert_message(message: &Message) -> LLMResult<ChatCompletionRequestMessage> {
        let converted: ChatCompletionRequestMessage = match message.role {
            // OpenRouter routes to many vendors; not all of them accept the developer role.
            MessageRole::System | MessageRole::Developer => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()?
                .into(),
            MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()?
                .into(),
            MessageRole::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if !message.content.is_empty() {
                    builder.content(message.content.clone());
                }
                if !message.tool_calls.is_empty() {
                    let calls = message
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.args.to_string(),
                            },
                        })
                        .collect::<Vec<_>>();
                    builder.tool_calls(calls);
                }
                builder.build()?.into()
            }
            MessageRole::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(message.content.clone())
                .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
                .build()?
                .into(),
        };
        Ok(converted)
    }

    fn convert_tool(schema: &ToolSchema) -> LLMResult<ChatCompletionTool> {
        let function = FunctionObjectArgs::default()
            .name(schema.name.clone())
            .description(schema.description.clone())
            .parameters(schema.parameters())
            .build()?;
        Ok(ChatCompletionToolArgs::default()
            .r#type(ChatCompletionToolType::Function)
            .function(function)
            .build()?)
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> LLMResult<GenerateResult> {
        let messages = messages
            .iter()
            .map(Self::convert_message)
            .collect::<LLMResult<Vec<_>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.options.model.clone()).messages(messages);
        if let Some(temperature) = self.options.temperature {
            request.temperature(temperature);
        }
        if !tools.is_empty() {
            let tools = tools
                .iter()
                .map(Self::convert_tool)
                .collect::<LLMResult<Vec<_>>>()?;
            request.tools(tools);
        }

        debug!(model = %self.options.model, tools = tools.len(), "sending chat completion");
        let response = self.client.chat().create(request.build()?).await?;

        let choice = response.choices.into_iter().next().ok_or(LLMError::EmptyResponse)?;
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let args = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments));
                CallInfo::new(call.id, call.function.name, args)
            })
            .collect();

        let tokens = response
            .usage
            .map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        Ok(GenerateResult {
            tokens,
            generation: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

impl Default for OpenAI {
    fn default() -> Self {
        Self::new()
    }
}

impl LLM for OpenAI {
    fn generate<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolSchema],
    ) -> BoxFuture<'a, LLMResult<GenerateResult>> {
        self.complete(messages, tools).boxed()
    }

    fn model_name(&self) -> &str {
        &self.options.model
    }
}
