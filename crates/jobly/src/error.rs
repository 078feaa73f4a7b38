//! Error types for jobly

use thiserror::Error;

/// Result type alias for jobly operations
pub type JoblyResult<T> = Result<T, JoblyError>;

/// Error kinds surfaced by the builders, guards, and repositories.
///
/// Every variant except [`JoblyError::Store`], [`JoblyError::Connection`] and
/// [`JoblyError::Pool`] is a deterministic, input-dependent failure; none of
/// them are retried.
#[derive(Debug, Error)]
pub enum JoblyError {
    /// Malformed, missing, or contradictory input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The targeted identity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A create collided with an existing identity
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The call carries no verified identity
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The identity is not allowed to perform the call
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Store failure, passed through uninterpreted
    #[error("Store error: {0}")]
    Store(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Token signing failure
    #[error("Token error: {0}")]
    Token(String),

    /// Missing or unparsable configuration
    #[error("Config error: {0}")]
    Config(String),
}

impl JoblyError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// HTTP-equivalent status for the route layer's boundary translator.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            _ => 500,
        }
    }

    /// Parse a tokio_postgres error into a more specific JoblyError.
    ///
    /// Unique violations become [`JoblyError::Conflict`] and foreign key
    /// violations become [`JoblyError::NotFound`] (the referenced row is
    /// missing). Everything else stays an opaque [`JoblyError::Store`].
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::Conflict(format!("{constraint}: {message}")),
                "23503" => return Self::NotFound(format!("{constraint}: {message}")),
                _ => {}
            }
        }
        Self::Store(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for JoblyError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
