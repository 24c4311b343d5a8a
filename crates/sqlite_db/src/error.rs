use greensand_core::db::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error from db connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("failed to execute query: {0}")]
    ExecuteQuery(#[from] rusqlite::Error),

    #[error("resource not found: {0}")]
    NotFound(String),
}

impl From<Error> for greensand_core::GreensandError {
    fn from(e: Error) -> Self {
        Self::Store(e.into())
    }
}

impl From<Error> for StoreError {
    fn from(value: Error) -> Self {
        use Error::*;
        match value {
            Pool(e) => StoreError::Internal(format!("db connection pool encountered an error: {e}")),
            ExecuteQuery(e) => StoreError::Internal(format!("failed to execute query: {e}")),
            NotFound(e) => StoreError::NotFound(e),
        }
    }
}
