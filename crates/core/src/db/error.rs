use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Internal(String),
    #[error("resource not found: {0}")]
    NotFound(String),
}
