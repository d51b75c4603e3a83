//! Contiguous staging: N collections, one allocation, one transfer
//!
//! Kernels frequently need several independent, typically small host-resident
//! collections (per-item shapes, offsets, scalar parameters) placed together
//! in one memory class. Staging packs them back-to-back in input order, each
//! region start rounded up to its element type's natural alignment relative
//! to the block start, then performs exactly one allocation in the requested
//! class and one copy pass (host) or one asynchronous transfer (device) for
//! the whole call - never N.
//!
//! Arity is resolved at compile time over tuples of collections, up to eight
//! plus the empty tuple. Either the single allocation and all copies succeed,
//! or the entire call fails and none of the returned pointers are valid.

use std::mem;
use std::ptr::{self, NonNull};

use crate::backend::{self, Stream};
use crate::error::{ScratchError, ScratchResult};
use crate::scratch::bump::{align_up, checked_align_up};
use crate::scratch::{MemoryClass, Scratchpad};

/// A staged input collection: homogeneous element type, statically sizeable.
pub trait StageSource {
    type Elem: Copy;
    fn elems(&self) -> &[Self::Elem];
}

impl<T: Copy> StageSource for &[T] {
    type Elem = T;
    fn elems(&self) -> &[T] {
        self
    }
}

impl<T: Copy> StageSource for &Vec<T> {
    type Elem = T;
    fn elems(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, const N: usize> StageSource for &[T; N] {
    type Elem = T;
    fn elems(&self) -> &[T] {
        self.as_slice()
    }
}

/// Byte size and alignment of a packed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Packed total, including inter-region alignment padding
    pub bytes: usize,
    /// Required block alignment: the maximum element alignment
    pub align: usize,
}

/// A compile-time list of heterogeneous collections that can be staged into
/// one packed block. Implemented for tuples of [`StageSource`] values.
pub trait StagedCollections {
    /// One typed pointer per collection, in input order.
    type Pointers;

    /// Number of collections in the list
    const COUNT: usize;

    /// Packed layout of all regions, overflow-checked.
    fn footprint(&self) -> ScratchResult<Footprint>;

    /// Copy every collection to its packed offset within `base` and return
    /// the sub-region pointers.
    ///
    /// # Safety
    /// `base` must be host-writable for `footprint().bytes` bytes and aligned
    /// to `footprint().align`.
    unsafe fn copy_into(&self, base: *mut u8) -> Self::Pointers;

    /// Sub-region pointers relative to `base`, without copying.
    ///
    /// # Safety
    /// `base` must be aligned to `footprint().align`; the pointers are only
    /// dereferenceable if `base` spans `footprint().bytes` bytes.
    unsafe fn pointers(&self, base: *mut u8) -> Self::Pointers;
}

impl StagedCollections for () {
    type Pointers = ();
    const COUNT: usize = 0;

    fn footprint(&self) -> ScratchResult<Footprint> {
        Ok(Footprint { bytes: 0, align: 1 })
    }

    unsafe fn copy_into(&self, _base: *mut u8) -> Self::Pointers {}

    unsafe fn pointers(&self, _base: *mut u8) -> Self::Pointers {}
}

macro_rules! staged_tuple {
    ($count:expr => $($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: StageSource),+> StagedCollections for ($($name,)+) {
            type Pointers = ($(NonNull<$name::Elem>,)+);
            const COUNT: usize = $count;

            fn footprint(&self) -> ScratchResult<Footprint> {
                let ($($name,)+) = self;
                let mut bytes = 0usize;
                let mut align = 1usize;
                $(
                    let elem_align = mem::align_of::<$name::Elem>();
                    align = align.max(elem_align);
                    bytes = checked_align_up(bytes, elem_align)
                        .and_then(|b| b.checked_add(mem::size_of_val($name.elems())))
                        .ok_or_else(|| ScratchError::InvalidArgument(
                            "packed staging layout overflows usize".to_string(),
                        ))?;
                )+
                Ok(Footprint { bytes, align })
            }

            unsafe fn copy_into(&self, base: *mut u8) -> Self::Pointers {
                let ($($name,)+) = self;
                let mut offset = 0usize;
                let out = ($(
                    {
                        let src = $name.elems();
                        offset = align_up(offset, mem::align_of::<$name::Elem>());
                        let dst = base.add(offset).cast::<$name::Elem>();
                        if !src.is_empty() {
                            ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
                        }
                        offset += mem::size_of_val(src);
                        NonNull::new_unchecked(dst)
                    },
                )+);
                let _ = offset;
                out
            }

            unsafe fn pointers(&self, base: *mut u8) -> Self::Pointers {
                let ($($name,)+) = self;
                let mut offset = 0usize;
                let out = ($(
                    {
                        let src = $name.elems();
                        offset = align_up(offset, mem::align_of::<$name::Elem>());
                        let sub = base.add(offset).cast::<$name::Elem>();
                        offset += mem::size_of_val(src);
                        NonNull::new_unchecked(sub)
                    },
                )+);
                let _ = offset;
                out
            }
        }
    };
}

staged_tuple!(1 => A);
staged_tuple!(2 => A, B);
staged_tuple!(3 => A, B, C);
staged_tuple!(4 => A, B, C, D);
staged_tuple!(5 => A, B, C, D, E);
staged_tuple!(6 => A, B, C, D, E, F);
staged_tuple!(7 => A, B, C, D, E, F, G);
staged_tuple!(8 => A, B, C, D, E, F, G, H);

/// Pack the collections into one host allocation and copy each into place
/// with sequential synchronous copies, in input order.
///
/// Returns one typed pointer per collection, immediately readable.
/// Zero collections perform no allocation and return an empty tuple.
pub fn to_contiguous_host<S, C>(pad: &mut S, collections: C) -> ScratchResult<C::Pointers>
where
    S: Scratchpad + ?Sized,
    C: StagedCollections,
{
    if C::COUNT == 0 {
        return Ok(unsafe { collections.pointers(NonNull::<u8>::dangling().as_ptr()) });
    }
    let footprint = collections.footprint()?;
    let base = pad.alloc(MemoryClass::Host, footprint.bytes, footprint.align)?;
    tracing::trace!(
        "staged {} collections into one host block: {} bytes",
        C::COUNT,
        footprint.bytes
    );
    Ok(unsafe { collections.copy_into(base.as_ptr()) })
}

/// Pack the collections into one device allocation with exactly one
/// asynchronous host-to-device transfer queued on `stream`.
///
/// Data is first gathered into a pinned-class scratch region host-side, then
/// shipped with a single copy; device sub-region order matches input order.
/// The caller must synchronize `stream` before reading the results. Zero
/// collections perform no allocation and return an empty tuple.
pub fn to_contiguous_gpu<S, C>(
    pad: &mut S,
    stream: &Stream,
    collections: C,
) -> ScratchResult<C::Pointers>
where
    S: Scratchpad + ?Sized,
    C: StagedCollections,
{
    if C::COUNT == 0 {
        return Ok(unsafe { collections.pointers(NonNull::<u8>::dangling().as_ptr()) });
    }
    let footprint = collections.footprint()?;

    let staging = pad.alloc(MemoryClass::Pinned, footprint.bytes, footprint.align)?;
    let _ = unsafe { collections.copy_into(staging.as_ptr()) };

    let device = pad.alloc(MemoryClass::Device, footprint.bytes, footprint.align)?;
    if footprint.bytes > 0 {
        unsafe {
            backend::copy_h2d_async(device.as_ptr(), staging.as_ptr(), footprint.bytes, stream)?;
        }
    }
    tracing::trace!(
        "staged {} collections into one device block: {} bytes, one async copy",
        C::COUNT,
        footprint.bytes
    );
    Ok(unsafe { collections.pointers(device.as_ptr()) })
}
