//! ScratchForge - per-invocation scratch memory for GPU compute kernels
//!
//! Compute kernels need transient working memory in several memory classes
//! (pageable host, pinned host, unified, device) for the duration of a single
//! invocation. This crate provides:
//!
//! - [`Scratchpad`] - the single allocation primitive every backend implements
//! - [`ScratchpadExt`] - typed allocation on top of it (elements, tensors,
//!   tensor lists, host/device staging copies)
//! - the contiguous-staging protocol ([`to_contiguous_host`] /
//!   [`to_contiguous_gpu`]) which packs N heterogeneous collections into one
//!   allocation and one transfer
//! - [`KernelContext`] - the per-backend bundle of queue handle and scratchpad
//!   that kernel invocations receive
//!
//! Device transfers are asynchronous on a caller-supplied [`Stream`]; callers
//! synchronize the stream before consuming results. Without the `rocm`
//! feature the crate runs in host emulation mode: device-class memory lives
//! in host RAM and stream submissions are deferred until `synchronize()`.

pub mod backend;
pub mod context;
pub mod error;
pub mod scratch;
pub mod shape;
pub mod view;

pub use backend::Stream;
pub use context::{ComputeBackend, ComputeCpu, ComputeGpu, CpuContext, GpuContext, KernelContext};
pub use error::{ScratchError, ScratchResult};
pub use scratch::staging::{to_contiguous_gpu, to_contiguous_host, StageSource, StagedCollections};
pub use scratch::{
    BumpAllocator, MemoryClass, PreallocScratchpad, ScratchSizes, Scratchpad, ScratchpadExt,
};
pub use shape::TensorShape;
pub use view::{TensorListView, TensorView};
