//! API error type and its HTTP mapping
//!
//! Every error leaves the service as the shared `ErrorResponse` body. A
//! rate limit rejection additionally carries a `Retry-After` header.

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use chrono::{DateTime, Utc};
use lg_core::Rejection;
use lg_shared::{error_codes, ErrorResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Too many failed login attempts, retry after {retry_after_seconds} seconds")]
    TooManyAttempts {
        retry_after_seconds: u64,
        blocked_until: DateTime<Utc>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Missing or invalid admin token")]
    Unauthorized,

    #[error("The requested resource was not found")]
    NotFound,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let body = match self {
            ApiError::TooManyAttempts {
                retry_after_seconds,
                blocked_until,
            } => {
                builder.insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()));
                ErrorResponse::new(error_codes::RATE_LIMIT_EXCEEDED, self.to_string())
                    .add_detail("retry_after_seconds", retry_after_seconds)
                    .add_detail("blocked_until", blocked_until)
            }
            ApiError::Validation(message) => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
            }
            ApiError::Unauthorized => ErrorResponse::new(error_codes::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound => ErrorResponse::new(error_codes::NOT_FOUND, self.to_string()),
        };

        builder.json(body)
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::TooManyAttempts {
            retry_after_seconds: rejection.retry_after_seconds,
            blocked_until: rejection.blocked_until,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
