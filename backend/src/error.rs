//! Error taxonomy of the HTTP surface.
//!
//! Every handler returns `Result<_, AppError>`; the `ResponseError` impl maps
//! each variant to its status code and a JSON `{"error": ...}` body.

use crate::payment::PaymentError;
use crate::render::RenderError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::engine::form::FormError;
use common::model::field::FieldError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Payment required")]
    PaymentRequired,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PaymentRequired => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MalformedTemplate(_) | AppError::UpstreamUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        HttpResponse::build(status).json(serde_json::json!({ "error": self.to_string() }))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::UpstreamUnavailable(format!("database: {}", e))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::UpstreamUnavailable(format!("storage: {}", e))
    }
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<FieldError> for AppError {
    fn from(e: FieldError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::MalformedTemplate(msg) => AppError::MalformedTemplate(msg),
            RenderError::MissingSource => {
                AppError::MalformedTemplate("template has no HTML body or file".to_string())
            }
            other => AppError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        AppError::UpstreamUnavailable(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::UpstreamUnavailable(format!("worker pool: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("Document".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::PaymentRequired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::MalformedTemplate("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_render_errors_map_to_taxonomy() {
        let e: AppError = RenderError::MalformedTemplate("bad zip".into()).into();
        assert!(matches!(e, AppError::MalformedTemplate(_)));
        let e: AppError = RenderError::Timeout(std::time::Duration::from_secs(1)).into();
        assert!(matches!(e, AppError::UpstreamUnavailable(_)));
    }
}
