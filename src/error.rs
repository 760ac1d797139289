//! Error types for the media router

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Model is not supported: {0}")]
    ModelNotSupported(String),

    /// A remote service answered with a non-success status
    #[error("Response {status}: {message}")]
    ResponseStatus { status: u16, message: String },

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("No provider available: {0}")]
    NoProviders(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable kind used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::HttpClient(_) => "http_client_error",
            AppError::ModelNotSupported(_) => "model_not_supported",
            AppError::ResponseStatus { .. } => "response_status_error",
            AppError::BackendError(_) => "backend_error",
            AppError::NoProviders(_) => "no_providers",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Json(_) => "json_error",
            AppError::Io(_) => "io_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ModelNotSupported(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::ResponseStatus { status, .. } => match *status {
                400 => StatusCode::BAD_REQUEST,
                401 => StatusCode::UNAUTHORIZED,
                402 => StatusCode::PAYMENT_REQUIRED,
                403 => StatusCode::FORBIDDEN,
                429 => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::HttpClient(_) | AppError::BackendError(_) => StatusCode::BAD_GATEWAY,
            AppError::NoProviders(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Turn a non-success remote response into [`AppError::ResponseStatus`]
pub async fn status_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = summarize_error_body(&body)
        .or_else(|| status.canonical_reason().map(String::from))
        .unwrap_or_else(|| "request failed".to_string());

    AppError::ResponseStatus {
        status: status.as_u16(),
        message,
    }
}

/// Prefer the JSON `error` field (string or `{message}`), else the raw text
fn summarize_error_body(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("error") {
            Some(serde_json::Value::String(message)) => return Some(message.clone()),
            Some(error) => {
                if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                    return Some(message.to_string());
                }
            }
            None => {}
        }
    }

    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind(),
            }
        }));

        (status, body).into_response()
    }
}
