use async_openai::error::OpenAIError;
use super::ollama::OllamaError;


#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("OpenAI-compatible API error: {0}")]
    OpenAIError(#[from] OpenAIError),

    #[error("Ollama error: {0}")]
    OllamaError(#[from] OllamaError),

    #[error("Model returned no choices")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
