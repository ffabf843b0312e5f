use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{log, Level};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;
use std::fmt;

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug)]
pub enum AppError {
    AlreadyExists(String),
    NotFound(String),
    InvalidInput(String),
    Uninitialized,
    Timeout(String),
    DatabaseError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::AlreadyExists(msg) => write!(f, "Already Exists: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid Input: {}", msg),
            AppError::Uninitialized => {
                write!(f, "Storage not initialized; call Storage::connect first")
            }
            AppError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn message(&self) -> String {
        match self {
            AppError::AlreadyExists(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::Timeout(msg) => msg.clone(),
            // store internals stay in the logs
            AppError::Uninitialized | AppError::DatabaseError(_) => {
                "Internal Server Error".to_string()
            }
        }
    }

    /// Server-side failures are errors; conflicts and misses are warnings.
    fn log_level(&self) -> Level {
        match self {
            AppError::AlreadyExists(_) | AppError::NotFound(_) => Level::Warn,
            AppError::InvalidInput(_) => Level::Info,
            AppError::Uninitialized | AppError::Timeout(_) | AppError::DatabaseError(_) => {
                Level::Error
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Uninitialized | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        log!(self.log_level(), "{}", self);
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.message(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY =>
            {
                AppError::AlreadyExists("employee_id already exists".to_string())
            }
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<bson::de::Error> for AppError {
    fn from(err: bson::de::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
