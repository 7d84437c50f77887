//! The turn runner: model parts in, ordered patch stream out.
//!
//! Ordering contract:
//! - The tool/args/placeholder patches of part `i` are fully emitted
//!   before any patch of part `i+1`.
//! - A part's final output patches follow its placeholder, never the
//!   reverse. In concurrent mode they may land after later parts'
//!   tool/args patches; sequential mode serializes everything.
//! - The patch channel closes once the runner and all spawned executors
//!   are done — that close is the turn's only end-of-stream signal.
//!
//! A dropped receiver (client gone) stops emission; pending tool output
//! is discarded, never buffered or retried.

use std::sync::Arc;

use patchchat_core::error::GatewayError;
use patchchat_core::gateway::ModelGateway;
use patchchat_core::part::Part;
use patchchat_core::patch::{Patch, PatchPath, flatten};
use patchchat_core::tool::{ToolOutcome, ToolRegistry};
use patchchat_core::tree::set_path;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What to do when the model requests a tool that is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownToolPolicy {
    /// Emit tool/args patches but no output patch; log and move on.
    #[default]
    Silent,
    /// Surface an error-shaped output patch so the user sees the gap.
    ErrorPatch,
}

/// Knobs for one decomposition pass.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    /// Provisional output message emitted before a tool resolves.
    /// `None` disables the placeholder entirely.
    pub placeholder: Option<String>,

    /// Unknown-tool handling.
    pub unknown_tool: UnknownToolPolicy,

    /// Execute tool `i` to completion before decomposing part `i+1`.
    /// Trades throughput for a fully serialized patch stream.
    pub sequential_tools: bool,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            placeholder: Some("Working on it…".into()),
            unknown_tool: UnknownToolPolicy::Silent,
            sequential_tools: false,
        }
    }
}

impl TurnOptions {
    /// Build options from the loaded configuration.
    pub fn from_config(config: &patchchat_config::TurnConfig) -> Self {
        Self {
            placeholder: config
                .placeholder_enabled
                .then(|| config.placeholder_text.clone()),
            unknown_tool: match config.unknown_tool.as_str() {
                "error" => UnknownToolPolicy::ErrorPatch,
                _ => UnknownToolPolicy::Silent,
            },
            sequential_tools: config.sequential_tools,
        }
    }
}

/// Failures of one turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Client disconnected mid-turn")]
    Disconnected,

    #[error("Turn task failed: {0}")]
    Internal(String),
}

/// Runs one prompt through the gateway and decomposes the response.
pub struct TurnRunner {
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolRegistry>,
    options: TurnOptions,
}

impl TurnRunner {
    pub fn new(gateway: Arc<dyn ModelGateway>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            gateway,
            tools,
            options: TurnOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TurnOptions) -> Self {
        self.options = options;
        self
    }

    /// Streaming pass: decompose the model's response into `tx`, one
    /// patch per leaf, in the order described at the top of this module.
    ///
    /// A gateway failure emits a single informational output and returns
    /// the error — no tool or args patches are ever produced for a turn
    /// that never got a model response.
    pub async fn run(&self, prompt: &str, tx: mpsc::Sender<Patch>) -> Result<(), TurnError> {
        let parts = match self.gateway.complete(prompt, &self.tools.declarations()).await {
            Ok(parts) => parts,
            Err(e) => {
                warn!(error = %e, "Model call failed");
                let notice = json!({ "message": format!("The request could not be completed: {e}") });
                let _ = send_all(&tx, flatten(PatchPath::part(0).key("output"), &notice)).await;
                return Err(e.into());
            }
        };

        info!(parts = parts.len(), "Decomposing model response");

        for (index, part) in parts.into_iter().enumerate() {
            let base = PatchPath::part(index);
            match part {
                Part::Text { content } => {
                    let body = json!({ "message": content });
                    send_all(&tx, flatten(base.key("output"), &body)).await?;
                }
                Part::FunctionCall { name, arguments } => {
                    send_all(
                        &tx,
                        vec![Patch::new(base.clone().key("tool"), json!(name))],
                    )
                    .await?;
                    send_all(
                        &tx,
                        flatten(base.clone().key("args"), &Value::Object(arguments.clone())),
                    )
                    .await?;

                    if self.tools.get(&name).is_none() {
                        match self.options.unknown_tool {
                            UnknownToolPolicy::Silent => {
                                debug!(tool = %name, "Unknown tool requested — skipping");
                            }
                            UnknownToolPolicy::ErrorPatch => {
                                let notice =
                                    json!({ "message": format!("Unknown tool: {name}") });
                                send_all(&tx, flatten(base.key("output"), &notice)).await?;
                            }
                        }
                        continue;
                    }

                    if let Some(text) = &self.options.placeholder {
                        send_all(
                            &tx,
                            vec![Patch::new(
                                base.clone().key("output").key("message"),
                                json!(text),
                            )],
                        )
                        .await?;
                    }

                    let output_base = base.key("output");
                    if self.options.sequential_tools {
                        let output =
                            execute_tool(&self.tools, &name, Value::Object(arguments)).await;
                        send_all(&tx, flatten(output_base, &output)).await?;
                    } else {
                        let tools = self.tools.clone();
                        let task_tx = tx.clone();
                        tokio::spawn(async move {
                            let output =
                                execute_tool(&tools, &name, Value::Object(arguments)).await;
                            for patch in flatten(output_base, &output) {
                                if task_tx.send(patch).await.is_err() {
                                    debug!(tool = %name, "Receiver gone — discarding tool output");
                                    break;
                                }
                            }
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Request/response pass: sequential execution, all patches applied
    /// to one tree, read back as `{tool, output}` rows once everything
    /// has completed. The degenerate single-batch form of the protocol —
    /// it converges to the same final tree as the streaming pass given
    /// the same parts and tool outputs.
    pub async fn run_batch(&self, prompt: &str) -> Result<Vec<ToolOutcome>, TurnError> {
        let batch_options = TurnOptions {
            placeholder: None,
            sequential_tools: true,
            ..self.options.clone()
        };
        let runner = TurnRunner {
            gateway: self.gateway.clone(),
            tools: self.tools.clone(),
            options: batch_options,
        };

        let (tx, mut rx) = mpsc::channel(64);
        let prompt = prompt.to_string();
        let handle = tokio::spawn(async move { runner.run(&prompt, tx).await });

        let mut tree = Value::Array(Vec::new());
        while let Some(patch) = rx.recv().await {
            set_path(&mut tree, patch.path.steps(), patch.value);
        }

        match handle.await {
            Ok(result) => result?,
            Err(e) => return Err(TurnError::Internal(e.to_string())),
        }

        let rows = match tree {
            Value::Array(entries) => entries
                .into_iter()
                .map(|entry| ToolOutcome {
                    tool: entry["tool"].as_str().map(String::from),
                    output: entry["output"].clone(),
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(rows)
    }
}

/// Execute one tool call, shaping failures as chat-visible output. The
/// patch stream never leaves a part's output path unresolved.
async fn execute_tool(tools: &ToolRegistry, name: &str, arguments: Value) -> Value {
    let Some(tool) = tools.get(name) else {
        return json!({ "message": format!("{name} is not available") });
    };

    match tool.execute(arguments).await {
        Ok(output) => output,
        Err(e) => {
            warn!(tool = %name, error = %e, "Tool execution failed");
            json!({ "message": format!("{name} failed: {e}") })
        }
    }
}

async fn send_all(tx: &mpsc::Sender<Patch>, patches: Vec<Patch>) -> Result<(), TurnError> {
    for patch in patches {
        tx.send(patch).await.map_err(|_| TurnError::Disconnected)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use patchchat_core::error::ToolError;
    use patchchat_core::tool::{Tool, ToolDeclaration};
    use patchchat_core::tree::Transcript;

    /// Gateway double that replays a fixed part sequence.
    struct ScriptedGateway(Vec<Part>);

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn complete(
            &self,
            _prompt: &str,
            _tools: &[ToolDeclaration],
        ) -> Result<Vec<Part>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl ModelGateway for FailingGateway {
        fn name(&self) -> &str {
            "failing"
        }
        async fn complete(
            &self,
            _prompt: &str,
            _tools: &[ToolDeclaration],
        ) -> Result<Vec<Part>, GatewayError> {
            Err(GatewayError::Network("connection refused".into()))
        }
    }

    /// Tool double that always rejects.
    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "brokenTool"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "brokenTool".into(),
                reason: "boom".into(),
            })
        }
    }

    /// Tool double that resolves slowly.
    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slowTool"
        }
        fn description(&self) -> &str {
            "Sleeps before answering"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(json!({ "message": "finally" }))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let dir = std::env::temp_dir().join("patchchat-turn-tests");
        let mut registry = patchchat_tools::default_registry(&dir);
        registry.register(Box::new(BrokenTool));
        registry.register(Box::new(SlowTool));
        Arc::new(registry)
    }

    async fn collect(runner: &TurnRunner, prompt: &str) -> Vec<Patch> {
        let (tx, mut rx) = mpsc::channel(256);
        runner.run(prompt, tx).await.unwrap();
        let mut patches = Vec::new();
        while let Some(patch) = rx.recv().await {
            patches.push(patch);
        }
        patches
    }

    fn positions(patches: &[Patch]) -> Vec<String> {
        patches.iter().map(|p| p.path.to_string()).collect()
    }

    #[tokio::test]
    async fn text_part_becomes_message_patch() {
        let runner = TurnRunner::new(
            Arc::new(ScriptedGateway(vec![Part::text("Hello there")])),
            registry(),
        );

        let patches = collect(&runner, "hi").await;
        assert_eq!(positions(&patches), vec!["payload[0].output.message"]);
        assert_eq!(patches[0].value, json!("Hello there"));
    }

    #[tokio::test]
    async fn function_call_emits_tool_args_placeholder_then_output() {
        let gateway = ScriptedGateway(vec![Part::function_call(
            "informUser",
            json!({"message": "Working"}),
        )]);
        let runner = TurnRunner::new(Arc::new(gateway), registry()).with_options(TurnOptions {
            placeholder: Some("One moment…".into()),
            sequential_tools: true,
            ..TurnOptions::default()
        });

        let patches = collect(&runner, "go").await;
        assert_eq!(
            positions(&patches),
            vec![
                "payload[0].tool",
                "payload[0].args.message",
                "payload[0].output.message",
                "payload[0].output.message",
            ]
        );
        // placeholder first, real output second — never the reverse
        assert_eq!(patches[2].value, json!("One moment…"));
        assert_eq!(patches[3].value, json!("Working"));
    }

    #[tokio::test]
    async fn draft_email_end_to_end() {
        let gateway = ScriptedGateway(vec![Part::function_call(
            "draftEmail",
            json!({"to": "a@b.com", "subject": "", "body": ""}),
        )]);
        let runner = TurnRunner::new(Arc::new(gateway), registry()).with_options(TurnOptions {
            placeholder: None,
            sequential_tools: true,
            ..TurnOptions::default()
        });

        let patches = collect(&runner, "draft an email to a@b.com").await;
        assert_eq!(
            positions(&patches),
            vec![
                "payload[0].tool",
                "payload[0].args.body",
                "payload[0].args.subject",
                "payload[0].args.to",
                "payload[0].output.body",
                "payload[0].output.status",
                "payload[0].output.subject",
                "payload[0].output.to",
            ]
        );

        let mut transcript = Transcript::new();
        transcript.push_user("draft an email to a@b.com");
        for patch in &patches {
            transcript.apply(patch);
        }
        assert_eq!(
            transcript.last_bot_content(),
            Some(&json!([{
                "tool": "draftEmail",
                "args": { "to": "a@b.com", "subject": "", "body": "" },
                "output": { "status": "draft", "to": "a@b.com", "subject": "", "body": "" }
            }]))
        );
    }

    #[tokio::test]
    async fn unknown_tool_silent_yields_no_output_patch() {
        let gateway = ScriptedGateway(vec![Part::function_call(
            "launchRocket",
            json!({"target": "moon"}),
        )]);
        let runner = TurnRunner::new(Arc::new(gateway), registry()).with_options(TurnOptions {
            placeholder: Some("…".into()),
            ..TurnOptions::default()
        });

        let patches = collect(&runner, "go").await;
        assert_eq!(
            positions(&patches),
            vec!["payload[0].tool", "payload[0].args.target"]
        );
    }

    #[tokio::test]
    async fn unknown_tool_error_policy_emits_error_output() {
        let gateway = ScriptedGateway(vec![Part::function_call("launchRocket", json!({}))]);
        let runner = TurnRunner::new(Arc::new(gateway), registry()).with_options(TurnOptions {
            unknown_tool: UnknownToolPolicy::ErrorPatch,
            ..TurnOptions::default()
        });

        let patches = collect(&runner, "go").await;
        assert_eq!(
            positions(&patches),
            vec!["payload[0].tool", "payload[0].output.message"]
        );
        assert_eq!(patches[1].value, json!("Unknown tool: launchRocket"));
    }

    #[tokio::test]
    async fn failing_executor_substitutes_error_output() {
        let gateway = ScriptedGateway(vec![Part::function_call("brokenTool", json!({}))]);
        let runner = TurnRunner::new(Arc::new(gateway), registry()).with_options(TurnOptions {
            placeholder: None,
            sequential_tools: true,
            ..TurnOptions::default()
        });

        let patches = collect(&runner, "go").await;
        assert_eq!(
            positions(&patches),
            vec!["payload[0].tool", "payload[0].output.message"]
        );
        let message = patches[1].value.as_str().unwrap();
        assert!(message.starts_with("brokenTool failed"));
    }

    #[tokio::test]
    async fn gateway_failure_emits_informational_patch() {
        let runner = TurnRunner::new(Arc::new(FailingGateway), registry());

        let (tx, mut rx) = mpsc::channel(16);
        let err = runner.run("hi", tx).await.unwrap_err();
        assert!(matches!(err, TurnError::Gateway(GatewayError::Network(_))));

        let mut patches = Vec::new();
        while let Some(patch) = rx.recv().await {
            patches.push(patch);
        }
        assert_eq!(positions(&patches), vec!["payload[0].output.message"]);
        assert!(
            patches[0]
                .value
                .as_str()
                .unwrap()
                .contains("could not be completed")
        );
    }

    #[tokio::test]
    async fn concurrent_output_lands_after_later_parts() {
        let gateway = ScriptedGateway(vec![
            Part::function_call("slowTool", json!({})),
            Part::text("meanwhile"),
        ]);
        let runner = TurnRunner::new(Arc::new(gateway), registry()).with_options(TurnOptions {
            placeholder: None,
            sequential_tools: false,
            ..TurnOptions::default()
        });

        let patches = collect(&runner, "go").await;
        assert_eq!(
            positions(&patches),
            vec![
                "payload[0].tool",
                "payload[1].output.message",
                "payload[0].output.message",
            ]
        );
        assert_eq!(patches[2].value, json!("finally"));
    }

    #[tokio::test]
    async fn batch_collects_tool_results_in_part_order() {
        let parts = vec![
            Part::text("Here you go."),
            Part::function_call("draftEmail", json!({"to": "a@b.com", "subject": "s", "body": "b"})),
        ];
        let runner = TurnRunner::new(Arc::new(ScriptedGateway(parts)), registry());

        let outcomes = runner.run_batch("email").await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].tool, None);
        assert_eq!(outcomes[0].output, json!({"message": "Here you go."}));
        assert_eq!(outcomes[1].tool, Some("draftEmail".into()));
        assert_eq!(
            outcomes[1].output,
            json!({"status": "draft", "to": "a@b.com", "subject": "s", "body": "b"})
        );
    }

    #[tokio::test]
    async fn batch_propagates_gateway_failure() {
        let runner = TurnRunner::new(Arc::new(FailingGateway), registry());
        assert!(matches!(
            runner.run_batch("hi").await,
            Err(TurnError::Gateway(_))
        ));
    }
}
