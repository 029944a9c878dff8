//!
//! # Custom Error Handling
//!
//! This module defines the error type `AppError` used throughout the service.
//! Account creation, the admin console, token handling and the storage layer all
//! report failures through it, so handlers can simply return `Result<_, AppError>`.
//!
//! `AppError` implements `actix_web::error::ResponseError`, turning each variant into
//! an HTTP status with a `{"error": message}` JSON body. `From` implementations for
//! `sqlx::Error`, `validator::ValidationErrors`, `jsonwebtoken::errors::Error` and
//! `bcrypt::BcryptError` allow propagation with the `?` operator.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Represents all possible errors that can occur within the service.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// The caller is authenticated but not allowed to perform the operation (HTTP 403).
    Forbidden(String),
    /// A malformed or otherwise unusable request (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// An error raised by the database driver (HTTP 500).
    DatabaseError(String),
    /// Input rejected by account invariants or field validation (HTTP 422).
    ValidationError(String),
    /// The process environment could not be turned into a `Config` (HTTP 500).
    ConfigError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            AppError::ValidationError(msg) => HttpResponse::UnprocessableEntity().json(json!({
                "error": msg
            })),
            // Driver and configuration details stay in the logs.
            AppError::DatabaseError(msg) | AppError::ConfigError(msg) => {
                log::error!("{}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            AppError::InternalServerError(msg) => HttpResponse::InternalServerError().json(json!({
                "error": msg
            })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound` and a unique violation (the email constraint is the
/// only unique column besides the key) maps to `ValidationError`. Everything else is a
/// `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                AppError::ValidationError("A user with this email already exists.".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`,
/// keeping the per-field messages.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
