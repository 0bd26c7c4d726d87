use crate::store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShelfError>;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid script or config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Generic(String),
}

impl From<String> for ShelfError {
    fn from(error: String) -> Self {
        ShelfError::Generic(error)
    }
}

impl From<&str> for ShelfError {
    fn from(error: &str) -> Self {
        ShelfError::Generic(error.to_string())
    }
}
