//! ROCm/HIP backend
//!
//! Real driver-backed allocation and transfer primitives for AMD GPUs.
//! Active only with the `rocm` feature; requires the amdhip64 runtime.

mod error;
mod ffi;
mod memory;
mod stream;

pub use error::{HipError, HipResult};
pub use memory::copy_d2h_sync;
pub(crate) use memory::{copy_h2d_async, RawBlock};
pub use stream::HipStream as Stream;
