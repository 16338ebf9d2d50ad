use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    /// Output token budget; the configured default when omitted.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub result: String,
}

/// Answer a question with retrieved context.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    let max_tokens = req.max_tokens.unwrap_or(state.system.config().max_output_tokens);

    let result = state.system.process_query(&req.text, max_tokens).await?;
    info!(query_len = req.text.len(), max_tokens, "query served");
    Ok(Json(QueryResponse { result }))
}
