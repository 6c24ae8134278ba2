// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{scraping::ScrapeError, services::explanation::ExplainError};

/// Every failure a handler can answer with.
///
/// Client mistakes are reported under `"message"`, server-side and upstream
/// failures under `"error"`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Detail is logged, never sent.
    #[error("internal error: {0}")]
    InternalServerError(String),

    /// A scraped site, the LLM providers or GitHub failed; the text is sent as-is.
    #[error("{0}")]
    Upstream(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    AuthError(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::InternalServerError(detail) => {
                tracing::error!("Internal Server Error: {}", detail);
                json!({ "error": "Internal Server Error" })
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                json!({ "error": msg })
            }
            AppError::AuthError(msg) => json!({ "error": msg }),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => json!({ "message": msg }),
        };

        (status, Json(body)).into_response()
    }
}

/// Lets handlers use `?` on queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ScrapeError> for AppError {
    fn from(err: ScrapeError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<ExplainError> for AppError {
    fn from(err: ExplainError) -> Self {
        AppError::Upstream(err.to_string())
    }
}
