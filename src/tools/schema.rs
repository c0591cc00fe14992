use serde::{Serialize, Deserialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArgSchema {
    pub name: String,
    pub arg_type: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgSchema>,
}

impl ToolSchema {
    /// JSON Schema object for the arguments, as function-calling APIs expect it.
    pub fn parameters(&self) -> Value {
        let mut properties = Map::new();
        for arg in &self.args {
            properties.insert(
                arg.name.clone(),
                json!({ "type": arg.arg_type, "description": arg.description }),
            );
        }
        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|arg| arg.required)
            .map(|arg| arg.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
