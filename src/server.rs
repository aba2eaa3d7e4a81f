//! Web UI and JSON API.
//!
//! A thin adapter over [`Assistant`]: a single-page form plus three JSON
//! endpoints. The server owns one assistant instance behind a mutex, so
//! analysis and question calls are serialized and a half-rebuilt index
//! can never be observed.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Single-page UI |
//! | `POST` | `/api/analyze` | Set the repository path and run analysis |
//! | `POST` | `/api/ask` | Answer a question |
//! | `GET`  | `/api/transcript` | The conversation transcript |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Error responses use a JSON body:
//! `{ "error": { "code": "bad_request", "message": "..." } }`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::assistant::Assistant;
use crate::config::Config;
use crate::models::TranscriptEntry;

#[derive(Clone)]
struct AppState {
    assistant: Arc<Mutex<Assistant>>,
}

/// Start the web UI, binding to the address in `[server].bind`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config, assistant: Assistant) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        assistant: Arc::new(Mutex::new(assistant)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/ask", post(handle_ask))
        .route("/api/transcript", get(handle_transcript))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("repo-chat listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn analysis_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "analysis_error".to_string(),
        message: message.into(),
    }
}

/// Map analysis failures to the most useful status: path and
/// configuration problems are the client's to fix, the rest are ours.
fn classify_analysis_error(err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);
    if msg.contains("path") || msg.contains("not set") || msg.contains("does not exist") {
        bad_request(msg)
    } else {
        analysis_error(msg)
    }
}

// ============ Handlers ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    path: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if request.path.trim().is_empty() {
        return Err(bad_request("path must not be empty"));
    }

    let mut assistant = state.assistant.lock().await;
    assistant
        .set_repo_path(request.path.trim().into())
        .map_err(|e| bad_request(format!("{:#}", e)))?;

    let message = assistant.analyze().await.map_err(classify_analysis_error)?;
    Ok(Json(MessageResponse { message }))
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let mut assistant = state.assistant.lock().await;
    let message = assistant.ask(question).await;
    Ok(Json(MessageResponse { message }))
}

#[derive(Serialize)]
struct TranscriptResponse {
    transcript: Vec<TranscriptEntry>,
}

async fn handle_transcript(State(state): State<AppState>) -> Json<TranscriptResponse> {
    let assistant = state.assistant.lock().await;
    Json(TranscriptResponse {
        transcript: assistant.session().transcript().to_vec(),
    })
}

const INDEX_PAGE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>repo-chat</title>
<style>
  body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
  input[type=text] { width: 70%; padding: 0.4rem; }
  button { padding: 0.4rem 1rem; }
  #transcript { border: 1px solid #ccc; padding: 1rem; margin-top: 1rem; min-height: 8rem; white-space: pre-wrap; }
  .user { color: #06c; }
  .assistant { color: #222; }
</style>
</head>
<body>
<h1>repo-chat</h1>
<p>
  <input type="text" id="path" placeholder="repository path">
  <button onclick="analyze()">Analyze</button>
</p>
<p>
  <input type="text" id="question" placeholder="ask a question">
  <button onclick="ask()">Ask</button>
</p>
<div id="transcript"></div>
<script>
async function post(url, body) {
  const resp = await fetch(url, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  const data = await resp.json();
  return data.message || (data.error && data.error.message) || 'unknown response';
}
function append(speaker, text) {
  const div = document.getElementById('transcript');
  const line = document.createElement('div');
  line.className = speaker;
  line.textContent = speaker + ': ' + text;
  div.appendChild(line);
}
async function analyze() {
  const path = document.getElementById('path').value;
  append('user', 'analyze ' + path);
  append('assistant', await post('/api/analyze', { path }));
}
async function ask() {
  const question = document.getElementById('question').value;
  append('user', question);
  append('assistant', await post('/api/ask', { question }));
  document.getElementById('question').value = '';
}
</script>
</body>
</html>
"#;
