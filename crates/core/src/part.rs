//! Model response parts.
//!
//! A completed model call yields an ordered sequence of parts: free text
//! interleaved with requests to invoke named tools. Part order is
//! semantically meaningful (rendered top to bottom) and is preserved all
//! the way through decomposition, transport, and reassembly.

use serde::{Deserialize, Serialize};

/// One element of the model's structured response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Free text from the model.
    Text { content: String },

    /// A request to invoke a named tool with JSON arguments.
    FunctionCall {
        name: String,
        #[serde(default)]
        arguments: serde_json::Map<String, serde_json::Value>,
    },
}

impl Part {
    /// Create a text part.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create a function-call part. Non-object argument values are
    /// treated as an empty argument map.
    pub fn function_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self::FunctionCall {
            name: name.into(),
            arguments,
        }
    }
}
