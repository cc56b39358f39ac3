//! Error handling - every failure becomes exactly one RFC 7807 response.

use actix_web::{
    HttpMessage, HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError,
    http::StatusCode,
};
use std::fmt;

use tt_core::DomainError;
use tt_core::validation::FieldError;
use tt_shared::{ErrorResponse, FieldViolation};

use crate::observability::RequestId;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    /// The request could not be parsed.
    BadRequest(String),
    /// Well-formed payload that violates field rules.
    Validation(Vec<FieldError>),
    NotFound(String),
    Conflict(String),
    StoreUnavailable(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(errors) => {
                write!(f, "Validation failed on {} field(s)", errors.len())
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(errors) => ErrorResponse::validation_failed(
                errors
                    .iter()
                    .map(|e| FieldViolation {
                        field: e.field.clone(),
                        reason: e.reason.clone(),
                    })
                    .collect(),
            ),
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::StoreUnavailable(detail) => {
                tracing::error!("Post store unavailable: {}", detail);
                ErrorResponse::service_unavailable()
            }
            AppError::Internal(detail) => {
                // Log internal errors, never return them
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Turns unparsable JSON bodies into 400 problem responses.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();
    tracing::debug!(request_id = %request_id, error = %err, "Rejected malformed request body");

    let detail = match &err {
        JsonPayloadError::ContentType => "Expected an application/json body".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Malformed request body: {}", e),
        _ => "Malformed request body".to_string(),
    };
    AppError::BadRequest(detail).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
