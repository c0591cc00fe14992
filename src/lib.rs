pub mod llm;
pub mod tools;
pub mod agent;
pub mod message;
pub mod config;
pub mod error;
pub mod server;
pub mod prelude;

// re-export the proc-macro attribute for convenient use: `use weather_agent::tool;` or `#[weather_agent::tool(...)]`
pub use weather_agent_macros::tool;

// paths the `#[tool]` expansion refers to
#[doc(hidden)]
pub use async_trait;
#[doc(hidden)]
pub use serde;
#[doc(hidden)]
pub use serde_json;
