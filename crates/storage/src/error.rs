use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            e => StoreError::Database(e),
        }
    }
}

impl From<tally_core::DomainError> for StoreError {
    fn from(e: tally_core::DomainError) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
