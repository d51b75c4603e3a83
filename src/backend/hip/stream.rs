//! HIP stream wrapper

use std::ptr;

use crate::backend::hip::ffi;
use crate::error::{ScratchError, ScratchResult};

// SAFETY: the stream handle is an opaque driver token; HIP stream operations
// are thread-safe on the driver side.
// NOTE: no Clone - cloning the raw handle would double-destroy on drop.
unsafe impl Send for HipStream {}
unsafe impl Sync for HipStream {}

/// Owned HIP stream; destroyed on drop.
#[derive(Debug)]
pub struct HipStream {
    stream: *mut std::ffi::c_void,
}

impl HipStream {
    /// Create a new HIP stream
    pub fn new() -> ScratchResult<Self> {
        let mut stream: *mut std::ffi::c_void = ptr::null_mut();
        let result = unsafe { ffi::hipStreamCreate(&mut stream) };
        if result != ffi::HIP_SUCCESS {
            return Err(ScratchError::TransferFailure(format!(
                "hipStreamCreate failed: {}",
                ffi::error_string(result)
            )));
        }
        if stream.is_null() {
            return Err(ScratchError::TransferFailure(
                "hipStreamCreate returned null pointer".to_string(),
            ));
        }
        tracing::debug!("created HIP stream {:?}", stream);
        Ok(HipStream { stream })
    }

    /// Block until all work queued on the stream has completed.
    pub fn synchronize(&self) -> ScratchResult<()> {
        let result = unsafe { ffi::hipStreamSynchronize(self.stream) };
        if result != ffi::HIP_SUCCESS {
            return Err(ScratchError::TransferFailure(format!(
                "hipStreamSynchronize failed: {}",
                ffi::error_string(result)
            )));
        }
        Ok(())
    }

    /// Raw stream handle for FFI calls
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.stream
    }
}

impl Drop for HipStream {
    fn drop(&mut self) {
        if !self.stream.is_null() {
            unsafe {
                ffi::hipStreamDestroy(self.stream);
            }
        }
    }
}
