//! Execution context: what a kernel invocation receives
//!
//! [`KernelContext`] is a plain aggregate with no behavior: the backend's
//! asynchronous queue handle plus the active scratchpad. The queue shape is
//! resolved per backend through the [`ComputeBackend`] capability tag at
//! compile time - CPU kernels carry no handle at all, GPU kernels carry a
//! stream reference - so generic kernel code specializes without any runtime
//! branch or dispatch overhead.

use crate::backend::Stream;
use crate::scratch::Scratchpad;

/// Capability tag selecting the per-backend context shape.
pub trait ComputeBackend {
    /// Handle identifying where asynchronous work is queued.
    type Queue<'s>: Copy
    where
        Self: 's;
}

/// CPU backend tag: work executes synchronously, no queue handle.
pub struct ComputeCpu;

/// GPU backend tag: asynchronous work is queued on a stream.
pub struct ComputeGpu;

impl ComputeBackend for ComputeCpu {
    type Queue<'s> = () where Self: 's;
}

impl ComputeBackend for ComputeGpu {
    type Queue<'s> = &'s Stream where Self: 's;
}

/// Per-backend bundle of queue handle and active scratchpad.
///
/// The single parameter through which a kernel invocation receives both
/// "where to queue asynchronous work" and "where to obtain scratch memory".
pub struct KernelContext<'ctx, B: ComputeBackend + 'ctx> {
    pub queue: B::Queue<'ctx>,
    pub scratchpad: &'ctx mut dyn Scratchpad,
}

impl<'ctx, B: ComputeBackend + 'ctx> KernelContext<'ctx, B> {
    pub fn new(queue: B::Queue<'ctx>, scratchpad: &'ctx mut dyn Scratchpad) -> Self {
        Self { queue, scratchpad }
    }
}

/// Context for CPU kernel invocations
pub type CpuContext<'ctx> = KernelContext<'ctx, ComputeCpu>;

/// Context for GPU kernel invocations
pub type GpuContext<'ctx> = KernelContext<'ctx, ComputeGpu>;

impl<'ctx> CpuContext<'ctx> {
    /// Build a CPU context over a scratchpad.
    pub fn over(scratchpad: &'ctx mut dyn Scratchpad) -> Self {
        Self::new((), scratchpad)
    }
}

impl<'ctx> GpuContext<'ctx> {
    /// The stream this invocation queues asynchronous work on.
    pub fn stream(&self) -> &'ctx Stream {
        self.queue
    }
}
