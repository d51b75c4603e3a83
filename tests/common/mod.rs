//! Shared fixtures for scratchpad integration tests

use std::ptr::NonNull;

use scratchforge::{
    MemoryClass, PreallocScratchpad, ScratchResult, ScratchSizes, Scratchpad,
};

/// Wraps a real scratchpad and counts successful `alloc` calls per memory
/// class, so tests can assert on allocation traffic.
pub struct CountingScratchpad {
    inner: PreallocScratchpad,
    allocs: [usize; MemoryClass::COUNT],
}

impl CountingScratchpad {
    pub fn new(sizes: ScratchSizes) -> Self {
        Self {
            inner: PreallocScratchpad::new(sizes),
            allocs: [0; MemoryClass::COUNT],
        }
    }

    pub fn allocs_in(&self, class: MemoryClass) -> usize {
        self.allocs[class.index()]
    }

    pub fn total_allocs(&self) -> usize {
        self.allocs.iter().sum()
    }

    pub fn inner(&self) -> &PreallocScratchpad {
        &self.inner
    }
}

impl Scratchpad for CountingScratchpad {
    fn alloc(
        &mut self,
        class: MemoryClass,
        bytes: usize,
        alignment: usize,
    ) -> ScratchResult<NonNull<u8>> {
        let ptr = self.inner.alloc(class, bytes, alignment)?;
        self.allocs[class.index()] += 1;
        Ok(ptr)
    }
}

/// One megabyte in every class; plenty for any test in this suite.
pub fn default_sizes() -> ScratchSizes {
    let mut sizes = ScratchSizes::new();
    for class in MemoryClass::ALL {
        sizes = sizes.with_capacity(class, 1 << 20);
    }
    sizes
}
