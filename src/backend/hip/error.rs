//! HIP error types

use thiserror::Error;

/// Low-level HIP failure, carrying the driver error text.
#[derive(Error, Debug, Clone)]
pub enum HipError {
    #[error("Memory allocation failed: {0}")]
    MemoryAllocationFailed(String),
    #[error("Memory copy failed: {0}")]
    MemoryCopyFailed(String),
    #[error("Stream error: {0}")]
    StreamError(String),
}

/// HIP result type
pub type HipResult<T> = Result<T, HipError>;
