//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for planning and document questions.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::events::{EventLog, ToolEvent};
use crate::orchestrator::Orchestrator;
use crate::rag::{ContextBuilder, OpenAIAnswerModel, RagEngine};
use crate::vector_store::SqliteVectorStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    /// Runs are serialized: the event bus holds one sink at a time.
    orchestrator: Mutex<Orchestrator>,
    rag: RagEngine,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    super::plan::check_ready(&settings)?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let orchestrator = Orchestrator::from_settings(&settings, &prompts)?;

    let store = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);
    let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings)?);
    let context = ContextBuilder::new(store, embedder, &settings.rag.collection)
        .with_top_k(settings.rag.top_k);
    let rag = RagEngine::new(context, Arc::new(OpenAIAnswerModel::from_settings(&settings)?))
        .with_prompts(prompts);

    let state = Arc::new(AppState {
        orchestrator: Mutex::new(orchestrator),
        rag,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/plan", post(plan))
        .route("/docs/ask", post(ask))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Itinera API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Plan", "POST /plan");
    Output::kv("Ask (documents)", "POST /docs/ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct PlanRequest {
    text: String,
}

#[derive(Serialize)]
struct PlanResponse {
    final_text: String,
    planner_text: String,
    trace: String,
    events: Vec<ToolEvent>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    citation: String,
    score: f32,
    content: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<ToolEvent>,
}

fn error_response(
    status: StatusCode,
    error: String,
    events: Vec<ToolEvent>,
) -> axum::response::Response {
    (status, Json(ErrorResponse { error, events })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlanRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "text must not be empty".to_string(),
            Vec::new(),
        );
    }

    let log = EventLog::new();
    let orchestrator = state.orchestrator.lock().await;

    match orchestrator.run_pipeline(&req.text, Arc::new(log.clone())).await {
        Ok(output) => Json(PlanResponse {
            final_text: output.final_text,
            planner_text: output.planner_text,
            trace: orchestrator.trace(),
            events: log.events(),
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), log.events()),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    match state.rag.ask(&req.question).await {
        Ok(response) => Json(AskResponse {
            answer: response.format_for_display(),
            sources: response
                .sources
                .into_iter()
                .map(|s| SourceInfo {
                    citation: s.citation(),
                    score: s.score,
                    content: s.content,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Vec::new()),
    }
}
