//! Offset-based bump allocation
//!
//! [`BumpAllocator`] is pure offset arithmetic over a fixed capacity: no
//! pointers, no freeing, no coalescing. The scratchpad owns the backing
//! block and turns offsets into pointers. Keeping the arithmetic separate
//! makes the non-overlap and alignment invariants unit-testable without any
//! GPU.

/// Align `offset` up to `alignment`, without overflow checking.
///
/// Alignment must be a power of two; callers validate sizes beforehand.
pub(crate) fn align_up(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

/// Overflow-checked variant of [`align_up`].
pub(crate) fn checked_align_up(offset: usize, alignment: usize) -> Option<usize> {
    offset
        .checked_add(alignment - 1)
        .map(|v| v & !(alignment - 1))
}

/// Bump allocator over a fixed byte capacity.
///
/// Returned offsets never overlap; exhaustion is permanent for the lifetime
/// of the allocator (scratch memory is reclaimed wholesale, never piecewise).
#[derive(Debug, Clone)]
pub struct BumpAllocator {
    capacity: usize,
    used: usize,
}

impl BumpAllocator {
    /// Create a bump allocator over `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, used: 0 }
    }

    /// Reserve `bytes` bytes aligned to `alignment`, returning the byte
    /// offset from the block start, or `None` when the capacity is exhausted.
    ///
    /// `alignment` must be a validated non-zero power of two.
    pub fn alloc(&mut self, bytes: usize, alignment: usize) -> Option<usize> {
        debug_assert!(alignment.is_power_of_two());
        let offset = checked_align_up(self.used, alignment)?;
        let end = offset.checked_add(bytes)?;
        if end > self.capacity {
            return None;
        }
        self.used = end;
        Some(offset)
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed so far, including alignment padding
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available from the current cursor
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(255, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(1000, 512), 1024);
    }

    #[test]
    fn test_checked_align_up_overflow() {
        assert_eq!(checked_align_up(usize::MAX, 256), None);
        // One past the last 256-aligned offset: rounding up overflows.
        assert_eq!(checked_align_up(usize::MAX - 254, 256), None);
        // The last 256-aligned offset itself needs no rounding.
        assert_eq!(
            checked_align_up(usize::MAX - 255, 256),
            Some(usize::MAX - 255)
        );
        assert_eq!(checked_align_up(100, 8), Some(104));
    }

    #[test]
    fn test_sequential_allocations_never_overlap() {
        let mut bump = BumpAllocator::new(10_000);
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for bytes in [100usize, 37, 512, 1, 999] {
            let offset = bump.alloc(bytes, 8).unwrap();
            for &(start, end) in &ranges {
                assert!(offset >= end || offset + bytes <= start);
            }
            ranges.push((offset, offset + bytes));
        }
    }

    #[test]
    fn test_alignment_honored() {
        let mut bump = BumpAllocator::new(10_000);
        bump.alloc(3, 1).unwrap();
        let offset = bump.alloc(16, 64).unwrap();
        assert_eq!(offset % 64, 0);
        let offset = bump.alloc(16, 1024).unwrap();
        assert_eq!(offset % 1024, 0);
    }

    #[test]
    fn test_exhaustion() {
        let mut bump = BumpAllocator::new(1024);
        assert!(bump.alloc(1000, 1).is_some());
        assert!(bump.alloc(100, 1).is_none());
        // Exhaustion is permanent but smaller requests may still fit.
        assert!(bump.alloc(24, 1).is_some());
        assert_eq!(bump.remaining(), 0);
    }

    #[test]
    fn test_padding_counts_against_capacity() {
        let mut bump = BumpAllocator::new(256);
        bump.alloc(1, 1).unwrap();
        // The next 128-aligned slot is at 128; a 200-byte request overruns.
        assert!(bump.alloc(200, 128).is_none());
        assert!(bump.alloc(128, 128).is_some());
        assert_eq!(bump.used(), 256);
    }

    #[test]
    fn test_zero_byte_reservation_moves_nothing() {
        let mut bump = BumpAllocator::new(64);
        let offset = bump.alloc(0, 8).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(bump.used(), 0);
    }
}
