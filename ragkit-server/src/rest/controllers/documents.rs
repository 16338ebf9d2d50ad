use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use ragkit_core::{DocumentId, LoadSource};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub id: DocumentId,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub loaded: usize,
    pub ids: Vec<DocumentId>,
}

/// Embed and store one document.
pub async fn add_document(
    State(state): State<AppState>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<(StatusCode, Json<AddDocumentResponse>), ApiError> {
    let id = state.system.retriever().add_document(req.content, req.metadata).await?;
    Ok((StatusCode::CREATED, Json(AddDocumentResponse { id })))
}

/// Load the multipart `file` field with the loader matching its file name.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) =
        multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else {
            return Err(ApiError::BadRequest("file field must carry a file name".to_string()));
        };
        let data = field.bytes().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let source = LoadSource::bytes(name, data.to_vec());
        let ids = state.system.retriever().load_documents(&source).await?;
        info!(file = %source.name(), loaded = ids.len(), "upload ingested");
        return Ok(Json(UploadResponse { loaded: ids.len(), ids }));
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}
