use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";

/// Every failure a handler can surface, mapped to a status code and a
/// `{success: false, message}` body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DuplicateEmail(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("mail delivery failed: {0:#}")]
    MailDelivery(anyhow::Error),

    #[error("{0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateEmail(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MailDelivery(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) | AppError::Database(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) => "File storage operation failed".to_string(),
            AppError::MailDelivery(_) => "Failed to send inquiry. Please try again.".to_string(),
            AppError::Database(_) | AppError::Unexpected(_) => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Internal detail of a 5xx, carried in response extensions so
/// `app::expose_error_detail` can surface it outside production.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "success": false, "message": self.public_message() });
        let mut res = (status, Json(body)).into_response();
        if status.is_server_error() {
            let detail = format!("{self:#}");
            error!(%status, error = %detail, "request failed");
            res.extensions_mut().insert(ErrorDetail(detail));
        }
        res
    }
}
