//! JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::BuildError;

#[derive(Debug)]
pub enum ApiError {
    /// 404 with a message for the client
    NotFound(String),
    /// Cache could not be built (500, logged)
    Build(BuildError),
    /// 500, logged
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Build(e) => {
                tracing::error!("Failed to build post cache: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to load posts".to_string(),
                )
            }
            Self::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
