//! Non-owning tensor views over scratch-owned memory
//!
//! Views are address + shape wrappers; they never allocate and never free.
//! Their pointers stay valid exactly until the originating [`Scratchpad`]
//! is dropped. Holding a view past that point is a use-after-free waiting
//! to happen - the ownership contract is documented, not borrow-checked,
//! because scratchpads keep serving allocations after views are handed out.
//!
//! [`Scratchpad`]: crate::scratch::Scratchpad

use std::ptr::NonNull;

use crate::shape::TensorShape;

/// Non-owning view of a single tensor: pointer, shape, element type.
#[derive(Debug, Clone)]
pub struct TensorView<T> {
    ptr: NonNull<T>,
    shape: TensorShape,
}

impl<T> TensorView<T> {
    /// Wrap a pointer and shape. The pointer must stay valid for
    /// `shape.volume()` elements for as long as the view is used.
    pub fn new(ptr: NonNull<T>, shape: TensorShape) -> Self {
        Self { ptr, shape }
    }

    /// Raw element pointer
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Tensor shape
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    /// Total element count (`volume` of the shape)
    pub fn len(&self) -> usize {
        self.shape.volume()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the elements as a slice.
    ///
    /// # Safety
    /// The backing memory must be host-accessible (not device-class on a real
    /// GPU), initialized for reads, and the owning scratchpad must still be
    /// alive. No other mutable access may overlap the returned borrow.
    pub unsafe fn as_slice(&self) -> &[T] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len())
    }

    /// Mutable slice over the elements.
    ///
    /// # Safety
    /// Same requirements as [`as_slice`](Self::as_slice), plus exclusive
    /// access to the element range.
    pub unsafe fn as_mut_slice(&mut self) -> &mut [T] {
        std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len())
    }
}

/// Batched tensor view: multiple items sharing one backing allocation.
///
/// Per-item element offsets are the exclusive prefix sum of per-item volumes,
/// in insertion order.
#[derive(Debug, Clone)]
pub struct TensorListView<T> {
    ptr: NonNull<T>,
    shapes: Vec<TensorShape>,
    offsets: Vec<usize>,
    total_elements: usize,
}

impl<T> TensorListView<T> {
    pub(crate) fn new(
        ptr: NonNull<T>,
        shapes: Vec<TensorShape>,
        offsets: Vec<usize>,
        total_elements: usize,
    ) -> Self {
        debug_assert_eq!(shapes.len(), offsets.len());
        Self {
            ptr,
            shapes,
            offsets,
            total_elements,
        }
    }

    /// Number of tensors in the batch
    pub fn num_items(&self) -> usize {
        self.shapes.len()
    }

    /// Sum of all item volumes
    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    /// Pointer to the start of the backing allocation
    pub fn base_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Per-item element offsets into the backing allocation
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Shape of item `index`
    pub fn shape(&self, index: usize) -> Option<&TensorShape> {
        self.shapes.get(index)
    }

    /// View of item `index`, sharing the backing allocation
    pub fn get(&self, index: usize) -> Option<TensorView<T>> {
        let offset = *self.offsets.get(index)?;
        let shape = self.shapes.get(index)?.clone();
        // Offsets were derived from the same volumes that sized the
        // allocation, so the add stays in bounds (or on the zero-size
        // sentinel with offset 0).
        let ptr = unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) };
        Some(TensorView::new(ptr, shape))
    }

    /// Iterate over all item views in insertion order
    pub fn iter(&self) -> impl Iterator<Item = TensorView<T>> + '_ {
        (0..self.num_items()).filter_map(move |i| self.get(i))
    }
}
