//! Reasoning-and-acting loop driven purely by prompt text.
//!
//! The model writes `Thought:` / `Action:` / `Action Input:` lines; the agent
//! runs the named tool, appends an `Observation:` and asks again, until the
//! model gives a `Final Answer:` or the iteration budget runs out.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::types::{Agent, AgentExecuteResult, AgentResult};
use crate::message::Message;
use crate::tools::traits::Tool;

pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Returned as the answer when the loop never reaches a final answer.
pub const ITERATION_LIMIT_REPLY: &str = "Agent stopped due to iteration limit or time limit.";

const FINAL_ANSWER: &str = "Final Answer:";
const INCOMPLETE_RESPONSE: &str = "Invalid or incomplete response";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.*?)\s*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .expect("valid action regex")
});
static ACTION_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Action\s*\d*\s*:\s*(.*?)").expect("valid action regex"));

/// One parsed model turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactStep {
    Action { tool: String, input: String },
    Finish(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Parsing LLM output produced both a final answer and a parse-able action: {0}")]
    AnswerAndAction(String),
}

impl ParseError {
    /// What the model is shown for this error. Output carrying both an answer
    /// and an action is not echoed back.
    pub fn observation(&self) -> String {
        match self {
            ParseError::AnswerAndAction(_) => INCOMPLETE_RESPONSE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Everything the model wrote before it started inventing an observation.
pub fn strip_observation(text: &str) -> &str {
    match text.find("\nObservation") {
        Some(idx) => &text[..idx],
        None => text,
    }
}

pub fn parse_output(text: &str) -> Result<ReactStep, ParseError> {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = ACTION_RE.captures(text) {
        if includes_answer {
            return Err(ParseError::AnswerAndAction(text.to_string()));
        }
        let tool = caps[1].trim().to_string();
        let input = caps[2].trim().trim_matches('"').to_string();
        return Ok(ReactStep::Action { tool, input });
    }

    if includes_answer {
        let answer = text.rsplit(FINAL_ANSWER).next().unwrap_or_default();
        return Ok(ReactStep::Finish(answer.trim().to_string()));
    }

    if ACTION_ONLY_RE.is_match(text) {
        Err(ParseError::MissingActionInput)
    } else {
        Err(ParseError::MissingAction)
    }
}

/// Tools take JSON; a ReAct action input is a string. A JSON object is passed
/// through, anything else is bound to the tool's first argument.
fn tool_input(tool: &dyn Tool, input: &str) -> Value {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(input) {
        return value;
    }
    let mut args = Map::new();
    if let Some(arg) = tool.args().into_iter().next() {
        args.insert(arg.name, Value::String(input.to_string()));
    }
    Value::Object(args)
}

fn render_prompt(tools: &str, tool_names: &str, input: &str, scratchpad: &str) -> String {
    format!(
        "Answer the following questions as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {input}
Thought:{scratchpad}"
    )
}

pub(crate) async fn run(agent: &Agent, input: &str) -> AgentExecuteResult {
    let tools = agent
        .tools
        .iter()
        .map(|(name, tool)| format!("{}: {}", name, tool.description()))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = agent.tools.keys().cloned().collect::<Vec<_>>().join(", ");

    let mut result = AgentResult::default();
    let mut scratchpad = String::new();

    for iteration in 1..=agent.max_iterations {
        let mut msgs = Vec::with_capacity(2);
        if let Some(prompt) = agent.system_prompt.as_ref() {
            msgs.push(Message::system(prompt.clone()));
        }
        msgs.push(Message::user(render_prompt(&tools, &tool_names, input, &scratchpad)));

        let res = agent.llm.generate(&msgs, &[]).await?;
        result.tokens += res.tokens;
        let output = strip_observation(&res.generation);

        let observation = match parse_output(output) {
            Ok(ReactStep::Finish(answer)) => {
                info!(agent = %agent.name, iteration, "final answer reached");
                result.generation = answer;
                return Ok(result);
            }
            Ok(ReactStep::Action { tool, input: action_input }) => match agent.get_tool(&tool) {
                Some(tool_impl) => {
                    info!(agent = %agent.name, iteration, tool = %tool, "running tool");
                    let observation = tool_impl.run(tool_input(tool_impl.as_ref(), &action_input)).await?;
                    result.tool_used = Some(tool);
                    observation
                }
                None => {
                    debug!(agent = %agent.name, tool = %tool, "model named an unknown tool");
                    format!("{tool} is not a valid tool, try one of [{tool_names}].")
                }
            },
            Err(err) => {
                debug!(agent = %agent.name, iteration, error = %err, "could not parse model output");
                err.observation()
            }
        };

        scratchpad.push_str(output);
        scratchpad.push_str("\nObservation: ");
        scratchpad.push_str(&observation);
        scratchpad.push_str("\nThought: ");
    }

    warn!(agent = %agent.name, max_iterations = agent.max_iterations, "iteration limit reached");
    result.generation = ITERATION_LIMIT_REPLY.to_string();
    Ok(result)
}
