//! Preallocated per-class scratch arenas
//!
//! [`PreallocScratchpad`] is the reference [`Scratchpad`] backend: one raw
//! block per memory class, materialized lazily on first use and subdivided
//! with bump allocation. A single block per class keeps driver allocation
//! traffic at one call per class per invocation - repeated small driver
//! allocations are exactly what the scratch layer exists to avoid.

use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

use crate::backend::RawBlock;
use crate::error::{ScratchError, ScratchResult};
use crate::scratch::bump::BumpAllocator;
use crate::scratch::{validate_alignment, zero_size_sentinel, MemoryClass, Scratchpad};

/// Warn above this size; scratch requests this large usually indicate a
/// sizing bug in the calling kernel.
const LARGE_ALLOC_WARN_BYTES: usize = 1024 * 1024 * 1024;

/// Per-class byte capacities for a [`PreallocScratchpad`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScratchSizes {
    bytes: [usize; MemoryClass::COUNT],
}

impl ScratchSizes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity for one class, builder-style.
    pub fn with_capacity(mut self, class: MemoryClass, bytes: usize) -> Self {
        self.bytes[class.index()] = bytes;
        self
    }

    /// Configured capacity for `class`
    pub fn capacity(&self, class: MemoryClass) -> usize {
        self.bytes[class.index()]
    }

    /// Sum of all class capacities
    pub fn total(&self) -> usize {
        self.bytes.iter().sum()
    }
}

struct ClassArena {
    block: RawBlock,
    bump: BumpAllocator,
}

/// Scratchpad backed by one preallocated arena per memory class.
///
/// Arenas are materialized on first allocation in their class and freed
/// wholesale when the scratchpad is dropped. A class with zero configured
/// capacity fails every non-zero request with `OutOfMemory`.
pub struct PreallocScratchpad {
    sizes: ScratchSizes,
    arenas: [Option<ClassArena>; MemoryClass::COUNT],
}

impl PreallocScratchpad {
    /// Create a scratchpad with the given per-class capacities.
    pub fn new(sizes: ScratchSizes) -> Self {
        Self {
            sizes,
            arenas: [None, None, None, None],
        }
    }

    /// Grow the configured capacity of a class before its arena exists.
    ///
    /// Fails with `InvalidArgument` once the class arena has been
    /// materialized - resizing a live arena would invalidate outstanding
    /// pointers.
    pub fn reserve(&mut self, class: MemoryClass, additional: usize) -> ScratchResult<()> {
        if self.arenas[class.index()].is_some() {
            return Err(ScratchError::InvalidArgument(format!(
                "{} arena is already materialized and cannot grow",
                class
            )));
        }
        let current = self.sizes.capacity(class);
        let grown = current.checked_add(additional).ok_or_else(|| {
            ScratchError::InvalidArgument(format!("{} arena capacity overflows usize", class))
        })?;
        self.sizes = self.sizes.clone().with_capacity(class, grown);
        Ok(())
    }

    /// Configured capacity for `class`
    pub fn capacity(&self, class: MemoryClass) -> usize {
        self.sizes.capacity(class)
    }

    /// Bytes consumed in `class`, including alignment padding
    pub fn allocated_bytes(&self, class: MemoryClass) -> usize {
        self.arenas[class.index()]
            .as_ref()
            .map(|a| a.bump.used())
            .unwrap_or(0)
    }

    /// Bytes still available in `class`
    pub fn remaining(&self, class: MemoryClass) -> usize {
        match &self.arenas[class.index()] {
            Some(arena) => arena.bump.remaining(),
            None => self.sizes.capacity(class),
        }
    }

    fn arena_mut(&mut self, class: MemoryClass, requested: usize) -> ScratchResult<&mut ClassArena> {
        let idx = class.index();
        if self.arenas[idx].is_none() {
            let capacity = self.sizes.capacity(class);
            if capacity == 0 {
                return Err(ScratchError::OutOfMemory {
                    class,
                    requested,
                    available: 0,
                });
            }
            let block = RawBlock::allocate(class, capacity)?;
            tracing::debug!(
                "materialized {} scratch arena: {} bytes at {:?}",
                class,
                capacity,
                block.base_ptr()
            );
            return Ok(self.arenas[idx].insert(ClassArena {
                block,
                bump: BumpAllocator::new(capacity),
            }));
        }
        self.arenas[idx].as_mut().ok_or_else(|| {
            ScratchError::InvalidArgument(format!("{} arena state is inconsistent", class))
        })
    }
}

impl Scratchpad for PreallocScratchpad {
    fn alloc(
        &mut self,
        class: MemoryClass,
        bytes: usize,
        alignment: usize,
    ) -> ScratchResult<NonNull<u8>> {
        validate_alignment(alignment)?;

        if bytes == 0 {
            tracing::trace!("zero-byte scratch request in {}: returning sentinel", class);
            return zero_size_sentinel(alignment);
        }
        if bytes > LARGE_ALLOC_WARN_BYTES {
            tracing::warn!(
                "outsized scratch request: {} MB in {}",
                bytes / (1024 * 1024),
                class
            );
        }

        let arena = self.arena_mut(class, bytes)?;
        let offset = arena
            .bump
            .alloc(bytes, alignment)
            .ok_or(ScratchError::OutOfMemory {
                class,
                requested: bytes,
                available: arena.bump.remaining(),
            })?;

        tracing::trace!(
            "scratch alloc: {} bytes at offset {} in {} (align={})",
            bytes,
            offset,
            class,
            alignment
        );

        // Offset is within the block by the bump contract; the block base is
        // aligned to BLOCK_ALIGN which bounds every accepted alignment.
        Ok(unsafe { NonNull::new_unchecked(arena.block.base_ptr().add(offset)) })
    }
}
