use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error surface of the dashboard API. Every failure body is
/// `{"error": message}` so the frontend can render it uniformly.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn no_data() -> Self {
        Self::new(StatusCode::NOT_FOUND, "No data found")
    }

    /// Upstream fetch failures surface as 500 with the underlying message.
    pub fn fetch(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "data service fetch failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
