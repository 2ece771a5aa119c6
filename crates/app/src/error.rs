use tally_core::DomainError;
use tally_import::ImportError;
use tally_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The input was rejected as a whole; nothing was written.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => Error::NotFound { entity, id },
            StoreError::Conflict(msg) => Error::Conflict(msg),
            e => Error::Store(e),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        StoreError::from(e).into()
    }
}

impl From<ImportError> for Error {
    fn from(e: ImportError) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<DomainError> for Error {
    fn from(e: DomainError) -> Self {
        Error::Validation(e.to_string())
    }
}
