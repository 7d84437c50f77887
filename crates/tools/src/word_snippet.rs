//! Word snippet tool — returns document-ready text content.
//!
//! The UI renders the snippet in a copyable block; nothing is written to
//! disk.

use async_trait::async_trait;
use patchchat_core::error::ToolError;
use patchchat_core::tool::Tool;
use serde_json::json;

pub struct WordSnippetTool;

#[async_trait]
impl Tool for WordSnippetTool {
    fn name(&self) -> &str {
        "generateWordSnippet"
    }

    fn description(&self) -> &str {
        "Generates a Microsoft Word-compatible snippet based on the provided text content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The text or formatted content to be inserted into a Word document snippet."
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        Ok(json!({ "content": content }))
    }
}
