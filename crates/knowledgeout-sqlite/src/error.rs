//! Error bridging between rusqlite and the domain taxonomy

use knowledgeout_core::Error;
use thiserror::Error;

/// Internal error type for code running under the connection lock.
///
/// Domain errors pass through unchanged; rusqlite failures collapse into
/// `Error::Storage` at the boundary, carrying no driver detail upward.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => e,
            StoreError::Sqlite(e) => Error::Storage(e.to_string()),
        }
    }
}

/// Result type for closures executed on the connection.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// True when the error is a UNIQUE (or other) constraint violation, the
/// accepted failure mode for write races on unique columns.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                ..
            },
            _,
        )
    )
}
