//! Scratch memory allocation for compute kernels
//!
//! [`Scratchpad`] is the single primitive every allocator backend implements:
//! `alloc(class, bytes, alignment) -> pointer`. Everything else - typed
//! element allocation, tensors, tensor lists, staging copies - is derived
//! from that primitive in [`ScratchpadExt`], so any backend allocation
//! strategy (arena, pool, driver allocator) is swappable without touching
//! callers.
//!
//! A scratchpad serves exactly one invocation context at a time. No internal
//! locking is performed; concurrent `alloc` calls from multiple threads
//! require external synchronization supplied by the caller.

pub mod bump;
pub mod prealloc;
pub mod staging;

use std::fmt;
use std::ptr::{self, NonNull};

use serde::{Deserialize, Serialize};

use crate::backend::{self, Stream};
use crate::error::{ScratchError, ScratchResult};
use crate::shape::TensorShape;
use crate::view::{TensorListView, TensorView};

pub use bump::BumpAllocator;
pub use prealloc::{PreallocScratchpad, ScratchSizes};

/// Memory class an allocation physically resides in.
///
/// Determines which backend allocator services the request and which copy
/// primitive applies. Shared with allocator-backend collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryClass {
    /// Pageable host memory
    Host,
    /// Page-locked host memory, directly addressable by the device
    Pinned,
    /// Managed memory migrating between host and device
    Unified,
    /// Device-resident memory, not host-accessible
    Device,
}

impl MemoryClass {
    /// Number of memory classes, for per-class tables
    pub const COUNT: usize = 4;

    /// All classes in declaration order
    pub const ALL: [MemoryClass; Self::COUNT] = [
        MemoryClass::Host,
        MemoryClass::Pinned,
        MemoryClass::Unified,
        MemoryClass::Device,
    ];

    /// Stable index for per-class tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether CPU code may dereference pointers in this class
    pub fn is_host_accessible(self) -> bool {
        !matches!(self, MemoryClass::Device)
    }
}

impl fmt::Display for MemoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryClass::Host => "host",
            MemoryClass::Pinned => "pinned",
            MemoryClass::Unified => "unified",
            MemoryClass::Device => "device",
        };
        write!(f, "{}", name)
    }
}

/// Interface for kernels to obtain transient working memory.
///
/// Contract:
/// - ranges returned by distinct calls on the same instance never overlap;
/// - `alignment` is honored exactly, never silently reduced;
/// - zero-byte requests return an aligned, non-null placeholder that must
///   never be dereferenced (distinguishable from failure because it is `Ok`);
/// - invalid alignment (zero, not a power of two, or above the arena block
///   alignment) is rejected with `InvalidArgument` before any allocation;
/// - out-of-memory is terminal for the call - retry policy belongs to the
///   caller.
///
/// Every pointer stays valid exactly until the scratchpad is dropped.
pub trait Scratchpad {
    /// Allocate `bytes` bytes in `class` with the given `alignment`.
    fn alloc(
        &mut self,
        class: MemoryClass,
        bytes: usize,
        alignment: usize,
    ) -> ScratchResult<NonNull<u8>>;
}

/// Typed allocation layer derived from [`Scratchpad::alloc`].
///
/// Blanket-implemented for every scratchpad, including `dyn Scratchpad`.
pub trait ScratchpadExt: Scratchpad {
    /// Allocate `count` contiguous elements of `T` with natural alignment.
    fn allocate<T: Copy>(&mut self, class: MemoryClass, count: usize) -> ScratchResult<NonNull<T>> {
        self.allocate_aligned(class, count, std::mem::align_of::<T>())
    }

    /// Allocate `count` contiguous elements of `T` with explicit alignment.
    fn allocate_aligned<T: Copy>(
        &mut self,
        class: MemoryClass,
        count: usize,
        alignment: usize,
    ) -> ScratchResult<NonNull<T>> {
        let bytes = count.checked_mul(std::mem::size_of::<T>()).ok_or_else(|| {
            ScratchError::InvalidArgument(format!(
                "element count {} overflows the addressable byte range",
                count
            ))
        })?;
        Ok(self.alloc(class, bytes, alignment)?.cast())
    }

    /// Allocate storage for a tensor of the given shape and wrap it as a view.
    fn alloc_tensor<T: Copy>(
        &mut self,
        class: MemoryClass,
        shape: TensorShape,
    ) -> ScratchResult<TensorView<T>> {
        let ptr = self.allocate::<T>(class, shape.volume())?;
        Ok(TensorView::new(ptr, shape))
    }

    /// Allocate one backing buffer for a batch of tensors.
    ///
    /// Per-item offsets are the exclusive prefix sum of per-item volumes in
    /// input order; the total allocation covers the summed volumes.
    fn alloc_tensor_list<T: Copy>(
        &mut self,
        class: MemoryClass,
        shapes: &[TensorShape],
    ) -> ScratchResult<TensorListView<T>> {
        let mut offsets = Vec::with_capacity(shapes.len());
        let mut total = 0usize;
        for shape in shapes {
            offsets.push(total);
            total = total.checked_add(shape.volume()).ok_or_else(|| {
                ScratchError::InvalidArgument(
                    "summed tensor list volume overflows usize".to_string(),
                )
            })?;
        }
        let ptr = self.allocate::<T>(class, total)?;
        Ok(TensorListView::new(ptr, shapes.to_vec(), offsets, total))
    }

    /// Allocate in pageable host memory and copy the collection in.
    fn to_host<T: Copy>(&mut self, collection: &[T]) -> ScratchResult<NonNull<T>> {
        copy_to_class(self, MemoryClass::Host, collection)
    }

    /// Allocate in pinned host memory and copy the collection in.
    fn to_pinned<T: Copy>(&mut self, collection: &[T]) -> ScratchResult<NonNull<T>> {
        copy_to_class(self, MemoryClass::Pinned, collection)
    }

    /// Allocate in unified memory and copy the collection in.
    fn to_unified<T: Copy>(&mut self, collection: &[T]) -> ScratchResult<NonNull<T>> {
        copy_to_class(self, MemoryClass::Unified, collection)
    }

    /// Allocate in device memory and queue one asynchronous host-to-device
    /// copy on `stream`.
    ///
    /// The caller must synchronize `stream` (or rely on stream ordering with
    /// subsequent work) before consuming the result.
    fn to_gpu<T: Copy>(&mut self, stream: &Stream, collection: &[T]) -> ScratchResult<NonNull<T>> {
        let ptr = self.allocate::<T>(MemoryClass::Device, collection.len())?;
        if !collection.is_empty() {
            unsafe {
                backend::copy_h2d_async(
                    ptr.as_ptr().cast(),
                    collection.as_ptr().cast(),
                    std::mem::size_of_val(collection),
                    stream,
                )?;
            }
        }
        Ok(ptr)
    }

    /// Pack several collections into one host allocation with one pass of
    /// synchronous copies. See [`staging::to_contiguous_host`].
    fn to_contiguous_host<C: staging::StagedCollections>(
        &mut self,
        collections: C,
    ) -> ScratchResult<C::Pointers> {
        staging::to_contiguous_host(self, collections)
    }

    /// Pack several collections into one device allocation with exactly one
    /// asynchronous transfer on `stream`. See [`staging::to_contiguous_gpu`].
    fn to_contiguous_gpu<C: staging::StagedCollections>(
        &mut self,
        stream: &Stream,
        collections: C,
    ) -> ScratchResult<C::Pointers> {
        staging::to_contiguous_gpu(self, stream, collections)
    }
}

impl<S: Scratchpad + ?Sized> ScratchpadExt for S {}

/// Allocate in a host-accessible class and copy elements synchronously.
fn copy_to_class<S: Scratchpad + ?Sized, T: Copy>(
    pad: &mut S,
    class: MemoryClass,
    collection: &[T],
) -> ScratchResult<NonNull<T>> {
    debug_assert!(class.is_host_accessible());
    let ptr = pad.allocate::<T>(class, collection.len())?;
    if !collection.is_empty() {
        unsafe {
            ptr::copy_nonoverlapping(collection.as_ptr(), ptr.as_ptr(), collection.len());
        }
    }
    Ok(ptr)
}

/// Reject alignments the allocation contract forbids.
///
/// Alignment is a strict contract up to the arena block alignment; larger
/// values cannot be honored relative to the block base and are rejected
/// rather than silently reduced.
pub(crate) fn validate_alignment(alignment: usize) -> ScratchResult<()> {
    if alignment == 0 || !alignment.is_power_of_two() {
        return Err(ScratchError::InvalidArgument(format!(
            "alignment must be a non-zero power of two, got {}",
            alignment
        )));
    }
    if alignment > backend::BLOCK_ALIGN {
        return Err(ScratchError::InvalidArgument(format!(
            "alignment {} exceeds the arena block alignment {}",
            alignment,
            backend::BLOCK_ALIGN
        )));
    }
    Ok(())
}

/// Aligned placeholder pointer for zero-byte allocations.
///
/// Non-null and aligned, never backed by memory, never dereferenced.
pub(crate) fn zero_size_sentinel(alignment: usize) -> ScratchResult<NonNull<u8>> {
    NonNull::new(alignment as *mut u8).ok_or_else(|| {
        ScratchError::InvalidArgument("zero alignment has no sentinel address".to_string())
    })
}
