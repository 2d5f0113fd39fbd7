//! CAD Kernel Abstraction for face recognition
//!
//! This crate provides:
//! - Abstract CAD kernel traits for STEP loading and face queries
//! - A pure Rust STEP (ISO 10303-21) kernel resolving faces, surfaces and labels
//! - An in-memory kernel for injecting canned surfaces

pub mod kernel;

// Re-exports for convenience
pub use kernel::{
    CadError, CadKernel, CadResult, CylinderParams, FaceId, LengthUnit, MemoryFace, MemoryKernel,
    MemorySurface, NullKernel, PlaneParams, Solid, StepImportOptions, SurfaceType,
    TopologyCounts, default_kernel,
};

#[cfg(feature = "step")]
pub use kernel::StepKernel;
