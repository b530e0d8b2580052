use thiserror::Error;

/// Failures surfaced by the repositories. `NotFound` is an expected outcome
/// for lookups; everything else is an unexpected storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}
