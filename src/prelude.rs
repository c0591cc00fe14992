pub use crate::agent::{
    traits::AgentRunner,
    types::{Agent, AgentMode, AgentResult},
};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::llm::{traits::LLM, CallInfo, GenerateResult};
pub use crate::message::Message;
pub use crate::tool;
pub use crate::tools::{
    schema::{ArgSchema, ToolSchema},
    traits::Tool,
    weather::{WeatherClient, WeatherTool},
};
