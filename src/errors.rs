use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use log::{error, warn};
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let code = e.code();
        let message = e.to_string();
        match e {
            DomainError::InvalidAddress(_) | DomainError::InvalidPackage(_) => {
                warn!("[{code}] {message}");
                AppError::BadRequest(message)
            }
            DomainError::NotFound(_) => AppError::NotFound(message),
            DomainError::DuplicateLabel(_) => {
                warn!("[{code}] {message}");
                AppError::Conflict(message)
            }
            DomainError::InvalidTransition { .. } => AppError::Unprocessable(message),
            DomainError::Issuance(_) => {
                error!("[{code}] {message}");
                AppError::Unavailable(
                    "Could not issue a tracking number, please retry shortly".to_string(),
                )
            }
            DomainError::Internal(msg) => {
                error!("[{code}] {msg}");
                AppError::Internal(msg)
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
