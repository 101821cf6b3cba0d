use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use haven::errors::AgentError;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
struct AskQuery {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmQuery {
    prompt: String,
    confirm: String,
}

#[derive(Debug, Serialize)]
struct AgentResponse {
    response: String,
}

/// A failed run, rendered as an explicit error instead of a partial reply
struct ApiError(AgentError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_model_failure() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// Run one agent turn with no confirmation
async fn ask_handler(
    State(state): State<AppState>,
    Query(query): Query<AskQuery>,
) -> Result<Json<AgentResponse>, ApiError> {
    let response = state
        .service
        .run(&query.prompt, None)
        .await
        .map_err(ApiError)?;
    Ok(Json(AgentResponse { response }))
}

// Replay the prompt followed by the user's confirmation
async fn confirm_handler(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<AgentResponse>, ApiError> {
    let response = state
        .service
        .run(&query.prompt, Some(&query.confirm))
        .await
        .map_err(ApiError)?;
    Ok(Json(AgentResponse { response }))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/agent/ask", get(ask_handler))
        .route("/agent/confirm", get(confirm_handler))
        .with_state(state)
}
