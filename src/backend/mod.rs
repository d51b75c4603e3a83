//! Backend surface: raw per-class allocation, streams, async copies
//!
//! The scratch layer talks to exactly three backend primitives: allocate a
//! raw block in a memory class, queue an asynchronous host-to-device copy on
//! a stream, and synchronize a stream. Two backends provide them:
//!
//! - `hip` (feature `rocm`): the real ROCm HIP runtime;
//! - `host` (default): host emulation, so the crate and its tests run on
//!   machines without a GPU. Device-class memory is host-resident and stream
//!   submissions are deferred until `synchronize()`.
//!
//! Both expose the same names, selected here by cfg, so the rest of the
//! crate is backend-agnostic.

#[cfg(not(feature = "rocm"))]
mod host;
#[cfg(not(feature = "rocm"))]
pub use host::Stream;
#[cfg(not(feature = "rocm"))]
pub(crate) use host::{copy_h2d_async, RawBlock};

#[cfg(feature = "rocm")]
pub mod hip;
#[cfg(feature = "rocm")]
pub use hip::{copy_d2h_sync, Stream};
#[cfg(feature = "rocm")]
pub(crate) use hip::{copy_h2d_async, RawBlock};

/// Alignment of every arena block base.
///
/// This bounds the largest per-allocation alignment the scratch contract can
/// honor: offsets are aligned relative to the block start, so alignment
/// beyond the base alignment cannot be guaranteed and is rejected up front.
pub(crate) const BLOCK_ALIGN: usize = 4096;
