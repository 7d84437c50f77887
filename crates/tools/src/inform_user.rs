//! Inform-user tool — relays an explanatory message to the chat.
//!
//! The model calls this when it wants to narrate what it is doing (or
//! decline) without performing any action.

use async_trait::async_trait;
use patchchat_core::error::ToolError;
use patchchat_core::tool::Tool;
use serde_json::json;

pub struct InformUserTool;

#[async_trait]
impl Tool for InformUserTool {
    fn name(&self) -> &str {
        "informUser"
    }

    fn description(&self) -> &str {
        "Sends an informational message to the user without executing any action."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message text to display to the user, explaining the next step or providing context."
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let message = arguments["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;

        Ok(json!({ "message": message }))
    }
}
