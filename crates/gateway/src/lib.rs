//! HTTP front door for SiteChat.
//!
//! Serves the chat widget, `POST /chat`, `POST /upload-knowledge` and
//! `GET /health`. Built on Axum.

pub mod api;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use sitechat_chat::ChatPipeline;
use sitechat_config::AppConfig;
use sitechat_knowledge::LocalKnowledgeStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: ChatPipeline,
    pub store: LocalKnowledgeStore,
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router.
///
/// Layers applied:
/// - CORS open to every origin, method and header (the widget is embedded cross-site)
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: SharedState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(api::chat_handler))
        .route("/upload-knowledge", post(api::upload_knowledge_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Fails before binding when no API key is configured.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.require_api_key()?;

    let provider = sitechat_providers::build_from_config(&config)?;
    let pipeline = ChatPipeline::from_config(&config, provider)?;
    let store = LocalKnowledgeStore::new(&config.knowledge.dir);

    let state = Arc::new(GatewayState { pipeline, store });
    let app = build_router(state, config.gateway.body_limit_bytes);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    info!(addr = %addr, knowledge_dir = %config.knowledge.dir.display(), "Gateway starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

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
