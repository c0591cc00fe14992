use std::sync::Arc;
use crate::message::Message;
use crate::llm::{LLMResult, GenerateResult};
use crate::tools::schema::ToolSchema;
use futures::future::BoxFuture;

/// Convert a concrete L into an `Arc<dyn LLM>`.
/// Convenience so callers can do `llm_to_arc_dyn(MyLlm::new(...))`.
pub fn llm_to_arc_dyn<L>(llm: L) -> Arc<dyn LLM>
where
    L: 'static + LLM,
{
    Arc::new(llm)
}

/// Core LLM trait. Uses BoxFuture with an explicit lifetime so implementations
/// can borrow the input `&[Message]` and avoid cloning large messages.
///
/// `async_trait` is not used here so the returned future can be annotated
/// with the input lifetime `'a`.
pub trait LLM: Send + Sync {
    /// Produce a generation result. `tools` are the functions the model may
    /// call; an empty slice means no tools are bound.
    fn generate<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolSchema],
    ) -> BoxFuture<'a, LLMResult<GenerateResult>>;

    /// Model identifier, used in logs.
    fn model_name(&self) -> &str;
}
