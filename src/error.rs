use thiserror::Error;

/// Errors raised by the entity, reporting and integration services.
///
/// The HTTP layer maps the variants onto status codes; see
/// `api::errors::AppError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    /// Bad input or a business-rule violation (duplicate username, unknown
    /// role, dangling foreign key, ...).
    #[error("{0}")]
    InvalidInput(String),

    /// The operation cannot run in the current state, e.g. sharing an
    /// incident that does not exist or to a network that is not configured.
    #[error("{0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("failed to encode payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// True when `err` is a foreign-key constraint failure reported by the store.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

/// True when `err` is a unique constraint failure reported by the store.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
