//! Tool trait — the abstraction over model-invocable capabilities.
//!
//! Tools are the side effects the model can request: draft an email,
//! render a report PDF, look up the weather. Each is a named,
//! schema-described executor whose output is an opaque JSON value the
//! protocol flattens without inspecting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ToolError;

/// A tool description advertised to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// The tool name as the model will request it (e.g. "draftEmail").
    pub name: String,

    /// Description of what the tool does.
    pub description: String,

    /// JSON Schema describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// The result of one response part, as returned by the batch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Which tool produced this; `None` for plain text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// The executor's output — opaque to the protocol, possibly nested.
    pub output: serde_json::Value,
}

/// The core Tool trait.
///
/// Each tool implements this and is registered in the [`ToolRegistry`]
/// built at startup. The protocol does not validate arguments against
/// `parameters_schema` — that happens upstream at the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique wire name of this tool (e.g. "generateReportPDF").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments, yielding an arbitrary
    /// JSON output value.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a declaration for the model gateway.
    fn to_declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// An immutable registry of available tools.
///
/// Built once at startup, shared via `Arc`, consumed two ways:
/// 1. Declarations are sent to the model to advertise capabilities.
/// 2. The decomposer looks up executors when the model requests them.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool declarations (for sending to the model).
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.values().map(|t| t.to_declaration()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
