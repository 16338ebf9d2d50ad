use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub documents: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let documents = state.system.retriever().store().len().await;
    Json(HealthResponse { status: "ok", documents })
}
