//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service, plus the mapping from
//! port errors to the user-facing messages returned by the handlers.

use crate::config::ConfigError;
use axum::http::StatusCode;
use edusync_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the identity schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

pub const GENERIC_AUTH_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Identity failures become one of three fixed strings.
pub fn auth_failure(err: &PortError) -> (StatusCode, String) {
    match err {
        PortError::InvalidCredentials | PortError::NotFound(_) | PortError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password.".to_string(),
        ),
        PortError::EmailInUse => (
            StatusCode::CONFLICT,
            "This email address is already in use.".to_string(),
        ),
        PortError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
        PortError::Unexpected(_) | PortError::MalformedOutput(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            GENERIC_AUTH_ERROR.to_string(),
        ),
    }
}

/// Flow failures: bad input is the caller's to fix, anything else is reported
/// as "Could not generate <what>".
pub fn flow_failure(what: &str, err: &PortError) -> (StatusCode, String) {
    match err {
        PortError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message.clone()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        _ => (
            StatusCode::BAD_GATEWAY,
            format!("Could not generate {}. Please try again.", what),
        ),
    }
}
