use sea_orm::{DbErr, SqlErr, TransactionError};
use thiserror::Error;

/// Outcome of a persistence call that did not succeed.
///
/// `NotFound` and `Duplicate` are expected conditions the caller decides how
/// to answer; `DbErr` carries everything else unmodified.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Turns a unique-constraint violation into `Duplicate`, leaves other errors alone.
    pub fn from_write(err: DbErr, entity: &'static str, key: impl ToString) -> Self {
        if is_unique_violation(&err) {
            ServiceError::duplicate(entity, key)
        } else {
            ServiceError::DbErr(err)
        }
    }
}

impl From<TransactionError<ServiceError>> for ServiceError {
    fn from(err: TransactionError<ServiceError>) -> Self {
        match err {
            TransactionError::Connection(db_err) => ServiceError::DbErr(db_err),
            TransactionError::Transaction(inner) => inner,
        }
    }
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
