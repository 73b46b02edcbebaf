use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Upstream service error: {0}")]
    UpstreamServiceError(String),

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No weather data: {0}")]
    NoData(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::LocationNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidConfiguration(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UnsupportedConfiguration(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            AppError::UpstreamServiceError(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::NoData(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Io(err) => {
                tracing::error!("I/O error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal storage error".to_string(),
                )
            }
            AppError::Csv(err) => {
                tracing::error!("CSV error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal data format error".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamServiceError(format!("request timed out: {}", err))
        } else {
            AppError::UpstreamServiceError(format!("request failed: {}", err))
        }
    }
}
