//! CAD Kernel Abstraction Layer
//!
//! Provides a trait-based abstraction over different geometry kernels
//! (built-in STEP reader, in-memory fixtures) to allow switching implementations.

mod memory;
mod traits;

#[cfg(feature = "step")]
mod step;

pub use memory::{MemoryFace, MemoryKernel, MemorySurface};
pub use traits::*;

#[cfg(feature = "step")]
pub use step::StepKernel;
