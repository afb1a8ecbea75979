//! Upload, listing, and label update handlers for `/api/files`.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use typecast::store::RecordId;
use typecast::{JobListing, JobOutcome, ReadableSchema};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Name of the multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Run an inference job on an uploaded file.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<JobOutcome>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        upload = Some((name, bytes));
        break;
    }

    let (name, bytes) = upload.ok_or(ApiError::FileNotProvided)?;
    info!(file = %name, bytes = bytes.len(), "Received upload");

    let engine = state.engine.clone();
    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.run_job(&name, &bytes, store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("Inference task failed: {}", e)))??;

    Ok(Json(outcome))
}

/// All recorded jobs, newest first.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<JobListing>>, ApiError> {
    Ok(Json(state.store.list()?))
}

/// Request body for replacing a job's labels.
#[derive(Deserialize)]
pub struct UpdateRequest {
    pub id: RecordId,
    pub dtypes: ReadableSchema,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Overwrite the stored labels of one job.
pub async fn update_file(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.update_dtypes(request.id, request.dtypes)?;
    Ok(Json(MessageResponse {
        message: "Record Updated".to_string(),
    }))
}
