use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {message}")]
    Validation { message: String, issues: Vec<String> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    /// Upstream answered with a 5xx status
    #[error("Upstream server error {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl AppError {
    /// Whether retrying the same upstream call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::HttpClient(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::Upstream { .. } => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, issues) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Validation { message, issues } => {
                (StatusCode::BAD_REQUEST, message, Some(issues))
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::EmailNotConfirmed => (
                StatusCode::FORBIDDEN,
                "Your email is not confirmed. Please check your inbox.".to_string(),
                None,
            ),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Session(_) => {
                tracing::error!(error = %self, "Internal error while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None)
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg, None),
            AppError::HttpClient(_) | AppError::Upstream { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string(), None)
            }
        };

        let body = match issues {
            Some(issues) => json!({ "error": message, "issues": issues }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
