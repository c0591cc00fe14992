use super::types::AgentExecuteResult;

/// Trait describing runtime operations an agent can perform.
#[async_trait::async_trait]
pub trait AgentRunner: Send + Sync {
    /// Answer one user message.
    async fn invoke(&self, input: &str) -> AgentExecuteResult;
}
