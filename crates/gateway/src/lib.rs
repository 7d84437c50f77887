//! HTTP and WebSocket server for PatchChat.
//!
//! Endpoints:
//!
//! - `GET  /ws`        — persistent channel; client sends `{prompt}`,
//!   server streams `{position, payload}` patch frames
//! - `POST /chat`      — batch variant; replies once with `{toolResults}`
//! - `GET  /tools`     — advertised tool declarations
//! - `GET  /health`    — liveness probe
//! - `/`, `/static/*`  — embedded chat frontend
//! - `/downloads/*`    — generated files (report PDFs etc.)
//!
//! Built on Axum. Each WebSocket connection owns its patch stream
//! exclusively; prompts on one socket are handled strictly in sequence,
//! so a turn's patches never interleave with another turn's.

pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use patchchat_core::gateway::ModelGateway;
use patchchat_core::patch::Patch;
use patchchat_core::tool::{ToolDeclaration, ToolOutcome, ToolRegistry};
use patchchat_turn::{TurnOptions, TurnRunner};

/// Shared application state.
pub struct AppState {
    pub gateway: Arc<dyn ModelGateway>,
    pub tools: Arc<ToolRegistry>,
    pub options: TurnOptions,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    fn runner(&self) -> TurnRunner {
        TurnRunner::new(self.gateway.clone(), self.tools.clone())
            .with_options(self.options.clone())
    }
}

/// Build the Axum router with all routes except the downloads mount
/// (which needs a filesystem path; see [`start`]).
pub fn build_router(state: SharedState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/tools", get(list_tools_handler))
        .route("/chat", post(chat_handler))
        .route("/ws", get(ws_handler))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server from loaded configuration.
pub async fn start(config: patchchat_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let gateway = patchchat_providers::build_from_config(&config)?;
    let tools = Arc::new(patchchat_tools::default_registry(
        &config.gateway.downloads_dir,
    ));
    let options = TurnOptions::from_config(&config.turn);

    tokio::fs::create_dir_all(&config.gateway.downloads_dir).await?;

    let state = Arc::new(AppState {
        gateway,
        tools,
        options,
    });

    let app = build_router(state).nest_service(
        "/downloads",
        tower_http::services::ServeDir::new(&config.gateway.downloads_dir),
    );

    info!(addr = %addr, "PatchChat server starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolDeclaration>,
}

async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.declarations(),
    })
}

#[derive(Deserialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Serialize)]
struct ChatResponse {
    #[serde(rename = "toolResults")]
    tool_results: Vec<ToolOutcome>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// `POST /chat` — the non-incremental variant: one reply after all
/// tools complete. Failures come back as an error body, never a trace.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<PromptRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(prompt_len = payload.prompt.len(), "Chat request received");

    match state.runner().run_batch(&payload.prompt).await {
        Ok(tool_results) => Ok(Json(ChatResponse { tool_results })),
        Err(e) => {
            error!(error = %e, "Batch turn failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Model request failed: {e}"),
                }),
            ))
        }
    }
}

// ── WebSocket ─────────────────────────────────────────────────────────────

/// One patch on the wire: a dot/bracket position string and the leaf
/// value that belongs there.
#[derive(Serialize)]
struct PatchFrame {
    position: String,
    payload: serde_json::Value,
}

impl From<Patch> for PatchFrame {
    fn from(patch: Patch) -> Self {
        Self {
            position: patch.path.to_string(),
            payload: patch.value,
        }
    }
}

/// `GET /ws` — upgrade to the persistent patch channel.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: SharedState) {
    let session = uuid::Uuid::new_v4();
    info!(%session, "WebSocket connection established");

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue, // ignore binary, ping, pong
            Err(_) => break,
        };

        let request: PromptRequest = match serde_json::from_str(&msg) {
            Ok(r) => r,
            Err(e) => {
                debug!(%session, error = %e, "Unparseable client frame");
                let notice = PatchFrame {
                    position: "payload[0].output.message".into(),
                    payload: serde_json::Value::String(format!("Invalid message: {e}")),
                };
                if send_frame(&mut socket, &notice).await.is_err() {
                    return;
                }
                continue;
            }
        };

        // One turn at a time per socket: the patch stream for this
        // prompt is fully delivered (channel closed) before the next
        // client frame is read.
        let (tx, mut rx) = mpsc::channel(64);
        let runner = state.runner();
        let prompt = request.prompt;
        tokio::spawn(async move {
            if let Err(e) = runner.run(&prompt, tx).await {
                warn!(error = %e, "Turn failed");
            }
        });

        while let Some(patch) = rx.recv().await {
            if send_frame(&mut socket, &PatchFrame::from(patch)).await.is_err() {
                // client gone; remaining patches are dropped with rx
                info!(%session, "WebSocket connection closed mid-turn");
                return;
            }
        }
    }

    info!(%session, "WebSocket connection closed");
}

async fn send_frame(socket: &mut WebSocket, frame: &PatchFrame) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).unwrap_or_default();
    socket.send(WsMessage::Text(json.into())).await
}
