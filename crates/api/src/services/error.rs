//! Service-layer error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Client-visible classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Storage,
}

impl ErrorKind {
    /// Stable machine-readable code used in error bodies.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Conflict => "conflict",
            Self::Storage => "storage_failure",
        }
    }
}

/// Errors raised by the directory, order lifecycle and proof store.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request is well-formed but not acceptable.
    #[error("{0}")]
    InvalidInput(String),

    /// A unique value could not be allocated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database failure.
    #[error("storage failure: {0}")]
    Repository(#[source] RepositoryError),

    /// Proof file could not be written.
    #[error("proof storage failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Repository(_) | Self::Io(_) => ErrorKind::Storage,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            // Foreign key races surface the same way as a failed existence check.
            RepositoryError::NotFound => Self::NotFound("referenced record"),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other @ RepositoryError::Database(_) => Self::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_are_classified() {
        assert_eq!(
            ServiceError::from(RepositoryError::NotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::from(RepositoryError::Conflict("slug".to_string())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ServiceError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut)).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ServiceError::NotFound("order").to_string(), "order not found");
    }
}
