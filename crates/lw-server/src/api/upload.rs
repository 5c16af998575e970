use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use lw_common::models::UploadSummary;

use crate::engine::ingest;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_SHEET_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_sheet))
        .layer(DefaultBodyLimit::max(MAX_SHEET_BYTES))
}

/// POST /api/v1/upload: multipart `file` field holding a CSV movement sheet
async fn upload_sheet(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, ApiError> {
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some("file") {
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {e}")))?
                    .to_vec(),
            );
        }
    }

    let data = data.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let text = String::from_utf8(data)
        .map_err(|_| ApiError::BadRequest("File must be UTF-8 CSV".to_string()))?;

    let sheet = ingest::parse_sheet(&text).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let summary = ingest::ingest(&state, sheet)
        .await
        .map_err(ApiError::internal("Internal server error"))?;

    Ok(Json(summary))
}
