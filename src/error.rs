//! Error taxonomy shared by the scheduler, the repository layer and the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// Record absent, or not owned by the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Snooze cap reached.
    #[error("snooze limit reached ({max} snoozes allowed)")]
    LimitExceeded { max: i32 },

    /// Operation not allowed from the reminder's current status.
    #[error("cannot {action} a reminder that is {status}")]
    InvalidState { action: &'static str, status: String },

    /// Weather or notification collaborator failure.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        AppError::Upstream(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::LimitExceeded { .. } | AppError::InvalidState { .. } => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        tracing::Span::current().record("error", tracing::field::display(&self));

        (
            status,
            Json(json!({"success": false, "message": self.to_string()})),
        )
            .into_response()
    }
}
