//! Gemini `generateContent` gateway implementation.
//!
//! Uses the Generative Language REST API directly:
//! - `?key=` query-parameter authentication
//! - tools advertised as `functionDeclarations`
//! - response parts arrive as `text` or `functionCall{name, args}` blocks
//!
//! One prompt in, one parsed part sequence out. No token streaming.

use async_trait::async_trait;
use patchchat_core::error::GatewayError;
use patchchat_core::gateway::ModelGateway;
use patchchat_core::part::Part;
use patchchat_core::tool::ToolDeclaration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Gemini REST gateway.
pub struct GeminiGateway {
    name: String,
    base_url: String,
    model: String,
    api_key: String,
    system_prompt: String,
    client: reqwest::Client,
}

impl GeminiGateway {
    /// Create a new Gemini gateway.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: api_key.into(),
            system_prompt: String::new(),
            client,
        }
    }

    /// Create with a custom base URL (e.g. for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pick the model to request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Prepend a system preamble to every prompt. Gemini's v1beta
    /// `generateContent` takes it inline in the user text.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn build_request(&self, prompt: &str, tools: &[ToolDeclaration]) -> GenerateContentRequest {
        let text = if self.system_prompt.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\nUser request: {prompt}", self.system_prompt)
        };

        let declarations: Vec<FunctionDeclaration> = tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![WirePart {
                    text: Some(text),
                    function_call: None,
                }],
            }],
            tools: if declarations.is_empty() {
                Vec::new()
            } else {
                vec![ToolBlock {
                    function_declarations: declarations,
                }]
            },
        }
    }

    /// Map the wire response to the ordered domain part sequence.
    /// Unrecognized part kinds are skipped, order preserved.
    fn parse_parts(response: GenerateContentResponse) -> Vec<Part> {
        let wire_parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        wire_parts
            .into_iter()
            .filter_map(|p| {
                if let Some(call) = p.function_call {
                    Some(Part::function_call(call.name, call.args))
                } else {
                    p.text.map(Part::text)
                }
            })
            .collect()
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        tools: &[ToolDeclaration],
    ) -> std::result::Result<Vec<Part>, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = self.build_request(prompt, tools);

        debug!(gateway = "gemini", model = %self.model, tools = tools.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(e.to_string())
                } else {
                    GatewayError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(GatewayError::AuthenticationFailed(
                "Invalid Gemini API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(GatewayError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        let parts = Self::parse_parts(api_resp);
        debug!(gateway = "gemini", parts = parts.len(), "Completion parsed");
        Ok(parts)
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolBlock>,
}

#[derive(Debug, Serialize)]
struct ToolBlock {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        rename = "functionCall",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
