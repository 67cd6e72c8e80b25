use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors surfaced by the quiz endpoints.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Invalid Wikipedia URL")]
    InvalidUrl,

    #[error("Invalid quiz id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    Validation(String),

    #[error("Quiz not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Failed to fetch article content: {0}")]
    Scrape(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl QuizError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QuizError::InvalidUrl
            | QuizError::InvalidId(_)
            | QuizError::Validation(_)
            | QuizError::Conflict(_) => StatusCode::BAD_REQUEST,
            QuizError::NotFound => StatusCode::NOT_FOUND,
            QuizError::Scrape(_) => StatusCode::BAD_GATEWAY,
            QuizError::Database(_) | QuizError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Quiz request failed: {:#}", self);
        } else {
            tracing::warn!("Quiz request rejected: {}", self);
        }

        let json_response = serde_json::json!({
            "detail": self.to_string(),
            "status": status.as_u16()
        });
        (status, Json(json_response)).into_response()
    }
}

pub type QuizResult<T> = Result<T, QuizError>;
