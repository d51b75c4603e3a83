//! Host emulation backend
//!
//! Backs every memory class with the system allocator and emulates stream
//! semantics: submitted copies are queued and executed when the stream is
//! synchronized, so "reading device results before synchronize" misbehaves
//! here the same way it would on real hardware. Tests can observe queued
//! traffic through [`Stream::pending_ops`].

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::{self, NonNull};
use std::sync::Mutex;

use crate::backend::BLOCK_ALIGN;
use crate::error::{ScratchError, ScratchResult};
use crate::scratch::MemoryClass;

/// One aligned raw allocation in a memory class, freed on drop.
pub(crate) struct RawBlock {
    base: NonNull<u8>,
    layout: Layout,
}

// The block is a plain byte range; access discipline lives in the scratchpad.
unsafe impl Send for RawBlock {}
unsafe impl Sync for RawBlock {}

impl RawBlock {
    pub(crate) fn allocate(class: MemoryClass, bytes: usize) -> ScratchResult<Self> {
        let layout = Layout::from_size_align(bytes.max(1), BLOCK_ALIGN).map_err(|e| {
            ScratchError::InvalidArgument(format!("arena block layout for {}: {}", class, e))
        })?;
        let raw = unsafe { alloc(layout) };
        let base = NonNull::new(raw).ok_or(ScratchError::OutOfMemory {
            class,
            requested: bytes,
            available: 0,
        })?;
        tracing::trace!(
            "host emulation: allocated {} bytes for {} class at {:?}",
            bytes,
            class,
            base.as_ptr()
        );
        Ok(Self { base, layout })
    }

    pub(crate) fn base_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.base.as_ptr(), self.layout);
        }
    }
}

/// A copy captured at submission time and applied at synchronize.
///
/// The source bytes are snapshotted on submit - the hardware path is free to
/// read the source asynchronously, so callers already may not touch it until
/// the stream is synchronized.
struct PendingCopy {
    dst: *mut u8,
    src: Vec<u8>,
}

// Destination pointers target scratch blocks that outlive the stream
// operations; the queue mutex serializes access.
unsafe impl Send for PendingCopy {}

/// Emulated asynchronous execution queue.
///
/// Submissions are deferred; `synchronize` drains the queue in submission
/// order. A submitted copy cannot be cancelled, only awaited.
pub struct Stream {
    pending: Mutex<Vec<PendingCopy>>,
}

impl Stream {
    pub fn new() -> ScratchResult<Self> {
        Ok(Self {
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Execute all queued copies, in submission order.
    pub fn synchronize(&self) -> ScratchResult<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ScratchError::TransferFailure("stream queue lock poisoned".to_string()))?;
        for op in pending.drain(..) {
            unsafe {
                ptr::copy_nonoverlapping(op.src.as_ptr(), op.dst, op.src.len());
            }
        }
        Ok(())
    }

    /// Number of submitted-but-unexecuted copies.
    pub fn pending_ops(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn submit(&self, dst: *mut u8, src: Vec<u8>) -> ScratchResult<()> {
        self.pending
            .lock()
            .map_err(|_| ScratchError::TransferFailure("stream queue lock poisoned".to_string()))?
            .push(PendingCopy { dst, src });
        Ok(())
    }
}

/// Queue one host-to-device copy on `stream`.
///
/// # Safety
/// `src` must be readable for `bytes` bytes at submission time; `dst` must
/// stay writable for `bytes` bytes until the stream is synchronized.
pub(crate) unsafe fn copy_h2d_async(
    dst: *mut u8,
    src: *const u8,
    bytes: usize,
    stream: &Stream,
) -> ScratchResult<()> {
    let snapshot = std::slice::from_raw_parts(src, bytes).to_vec();
    stream.submit(dst, snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_base_is_block_aligned() {
        let block = RawBlock::allocate(MemoryClass::Host, 100).unwrap();
        assert_eq!(block.base_ptr() as usize % BLOCK_ALIGN, 0);
    }

    #[test]
    fn test_stream_defers_copies_until_synchronize() {
        let stream = Stream::new().unwrap();
        let src = [1u8, 2, 3, 4];
        let mut dst = [0u8; 4];

        unsafe {
            copy_h2d_async(dst.as_mut_ptr(), src.as_ptr(), 4, &stream).unwrap();
        }
        assert_eq!(stream.pending_ops(), 1);
        assert_eq!(dst, [0, 0, 0, 0]);

        stream.synchronize().unwrap();
        assert_eq!(stream.pending_ops(), 0);
        assert_eq!(dst, [1, 2, 3, 4]);
    }

    #[test]
    fn test_copies_apply_in_submission_order() {
        let stream = Stream::new().unwrap();
        let mut dst = [0u8; 2];
        unsafe {
            copy_h2d_async(dst.as_mut_ptr(), [7u8, 7].as_ptr(), 2, &stream).unwrap();
            copy_h2d_async(dst.as_mut_ptr(), [9u8].as_ptr(), 1, &stream).unwrap();
        }
        stream.synchronize().unwrap();
        assert_eq!(dst, [9, 7]);
    }

    #[test]
    fn test_synchronize_on_empty_stream() {
        let stream = Stream::new().unwrap();
        assert!(stream.synchronize().is_ok());
    }
}
