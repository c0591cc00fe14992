//! Single-hop tool binding: the model sees the tools natively and either
//! answers or asks for one call, whose output becomes the reply.

use tracing::{debug, info};

use super::error::AgentError;
use super::types::{Agent, AgentExecuteResult, AgentResult};
use crate::message::Message;

pub(crate) async fn run(agent: &Agent, input: &str) -> AgentExecuteResult {
    let mut msgs = Vec::with_capacity(2);
    if let Some(prompt) = agent.system_prompt.as_ref() {
        msgs.push(Message::system(prompt.clone()));
    }
    msgs.push(Message::user(input));

    let schemas = agent.tool_schemas();
    let res = agent.llm.generate(&msgs, &schemas).await?;
    let mut result = AgentResult {
        tokens: res.tokens,
        ..Default::default()
    };

    let extra_calls = res.tool_calls.len().saturating_sub(1);
    let Some(call) = res.tool_calls.into_iter().next() else {
        debug!(agent = %agent.name, "model answered without tools");
        result.generation = res.generation;
        return Ok(result);
    };
    if extra_calls > 0 {
        debug!(agent = %agent.name, ignored = extra_calls, "only the first tool call is dispatched");
    }

    let tool = agent
        .get_tool(&call.name)
        .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
    info!(agent = %agent.name, tool = %call.name, args = %call.args, "dispatching tool call");
    result.generation = tool.run(call.args).await?;
    result.tool_used = Some(call.name);
    Ok(result)
}
