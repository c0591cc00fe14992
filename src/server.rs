//! HTTP surface: `POST /api/chat`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::agent::{error::AgentError, traits::AgentRunner, types::Agent};
use crate::config::Config;
use crate::error::Result;
use crate::llm;
use crate::tools::weather::WeatherClient;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn AgentRunner>,
}

impl AppState {
    pub fn new(agent: Arc<dyn AgentRunner>) -> Self {
        Self { agent }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Any failure while answering; rendered as `500 {"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the model backend, weather client and agent a config describes,
/// and mount them on the router.
pub fn app_from_config(config: &Config) -> Result<Router> {
    let llm = llm::from_config(&config.llm)?;
    let weather = WeatherClient::from_config(&config.weather);
    let agent = Agent::from_config(&config.agent, llm, weather);
    Ok(router(AppState::new(Arc::new(agent))))
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    match state.agent.invoke(&req.message).await {
        Ok(result) => {
            info!(
                tool = result.tool_used.as_deref().unwrap_or("-"),
                total_tokens = result.tokens.total_tokens,
                "chat answered"
            );
            Ok(Json(ChatResponse { response: result.generation }))
        }
        Err(err) => {
            error!(error = %err, "chat failed");
            Err(err.into())
        }
    }
}
