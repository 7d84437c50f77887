//! Email drafting tool — assembles a draft ready for review.
//!
//! No mail is sent; the output is rendered by the chat UI as a draft
//! card the user can copy out.

use async_trait::async_trait;
use patchchat_core::error::ToolError;
use patchchat_core::tool::Tool;
use serde_json::json;

pub struct DraftEmailTool;

#[async_trait]
impl Tool for DraftEmailTool {
    fn name(&self) -> &str {
        "draftEmail"
    }

    fn description(&self) -> &str {
        "Creates an email draft ready for sending, including recipient, subject, and message body."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "The email address of the recipient."
                },
                "subject": {
                    "type": "string",
                    "description": "The subject line of the email."
                },
                "body": {
                    "type": "string",
                    "description": "The main content of the email body, supporting plain text or HTML."
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let to = arguments["to"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'to' argument".into()))?;
        let subject = arguments["subject"].as_str().unwrap_or_default();
        let body = arguments["body"].as_str().unwrap_or_default();

        Ok(json!({
            "status": "draft",
            "to": to,
            "subject": subject,
            "body": body,
        }))
    }
}
