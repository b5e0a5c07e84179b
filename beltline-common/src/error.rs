//! Common error types for Beltline

use thiserror::Error;

/// Common result type for Beltline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Beltline crates
///
/// The HTTP layer maps these onto status codes; everything not listed below
/// surfaces as an internal error.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with existing state (uniqueness, progression order)
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to perform this action
    #[error("{0}")]
    Forbidden(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the wrapped database error is a unique-constraint violation.
    ///
    /// The store's uniqueness constraint is the final arbiter for concurrent
    /// inserts; callers translate this case to `Conflict`.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
