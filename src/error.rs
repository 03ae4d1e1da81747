//! Error types surfaced by the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::history::HistoryError;

/// Input rejected before any scoring or rewriting happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No text provided")]
    Missing,

    #[error("Empty text provided")]
    Empty,

    #[error("Text too long (max {max} characters)")]
    TooLong { max: usize },
}

impl ValidationError {
    /// Wording used for flash messages on the HTML pages.
    pub fn flash_message(&self) -> String {
        match self {
            ValidationError::Missing | ValidationError::Empty => {
                "Please enter some text to analyze.".to_string()
            }
            ValidationError::TooLong { max } => {
                format!("Text is too long. Please limit to {} characters.", max)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] HistoryError),

    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Empty text provided")]
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::NotFound(e) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Template(_) => {
                tracing::error!("🔥 {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
