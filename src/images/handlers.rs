use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::services::{store_upload, UploadItem};
use crate::{error::AppError, state::AppState};

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub saved_as: String,
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Buffers one multipart file part.
pub(crate) async fn read_upload(field: Field<'_>) -> Result<UploadItem, MultipartError> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".into());
    let body = field.bytes().await?;
    Ok(UploadItem {
        filename,
        content_type,
        body,
    })
}

/// POST /upload (multipart), field `image`.
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let Ok(mut mp) = mp else {
        warn!("upload without multipart body");
        return Err(AppError::NoImage);
    };

    let mut image = None;
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart upload");
        AppError::BadRequest
    })? {
        if image.is_none() && field.name() == Some("image") {
            image = Some(read_upload(field).await.map_err(|_| AppError::BadRequest)?);
        }
    }

    let item = image.ok_or(AppError::NoImage)?;
    let saved_as = store_upload(&state, item).await?;
    info!(%saved_as, "image uploaded");
    Ok(Json(UploadResponse { saved_as }))
}
