use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad_request")]
    BadRequest,

    #[error("name_required")]
    NameRequired,

    #[error("no_image")]
    NoImage,

    #[error("storage_error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest => "bad_request",
            AppError::NameRequired => "name_required",
            AppError::NoImage => "no_image",
            AppError::Storage(_) => "storage_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest | AppError::NameRequired | AppError::NoImage => {
                StatusCode::BAD_REQUEST
            }
            AppError::Storage(ref e) => {
                error!(error = %format!("{e:#}"), "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.code() }))).into_response()
    }
}
