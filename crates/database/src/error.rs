//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Caller is not allowed to perform the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed or inconsistent input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing failure
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

impl From<ValidationError> for DatabaseError {
    fn from(err: ValidationError) -> Self {
        DatabaseError::InvalidInput(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for DatabaseError {
    fn from(err: argon2::password_hash::Error) -> Self {
        DatabaseError::PasswordHash(err.to_string())
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
