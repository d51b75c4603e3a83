//! Error types for scratch allocation and transfers
//!
//! Three terminal conditions cover the whole crate: the arena for a memory
//! class is exhausted, the caller passed an invalid request, or the device
//! copy primitive failed. None of them are retried internally; they surface
//! to the caller of the triggering operation, which is expected to abort the
//! kernel invocation.

use thiserror::Error;

use crate::scratch::MemoryClass;

/// Scratch allocation / transfer error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScratchError {
    /// The requested memory class cannot satisfy the byte/alignment request.
    #[error("out of memory in {class} scratch: requested {requested} bytes, {available} available")]
    OutOfMemory {
        class: MemoryClass,
        requested: usize,
        available: usize,
    },

    /// Precondition violation: bad alignment, size overflow, mismatched
    /// shapes. Reported before any allocation happens.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The asynchronous copy primitive reported a driver/execution error.
    #[error("transfer failed: {0}")]
    TransferFailure(String),
}

impl ScratchError {
    /// Whether the caller may plausibly retry after freeing resources.
    ///
    /// Only out-of-memory qualifies: the next invocation can reserve a larger
    /// arena. Invalid arguments and transfer failures indicate bugs or driver
    /// faults and should not be retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScratchError::OutOfMemory { .. })
    }
}

/// Result alias used throughout the crate
pub type ScratchResult<T> = Result<T, ScratchError>;
