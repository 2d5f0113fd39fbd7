//! Face recognition core
//!
//! This crate provides:
//! - Face classification into planes, cylinders and unrecognized surfaces
//! - A deduplicating feature registry and its `features.json` form
//! - Tolerance tag parsing from face labels
//! - The batch traversal driver and the face selection handler

pub mod batch;
pub mod classify;
pub mod registry;
pub mod selection;
pub mod tag;

// Re-exports for convenience
pub use batch::{
    BatchDriver, BatchError, BatchOptions, BatchReport, BatchResult, FaultPolicy, run_batch,
};
pub use classify::{
    Classification, Cylinder, GEOMETRY_DECIMALS, Plane, RawKey, SurfaceDescriptor, classify,
    round_to,
};
pub use registry::{
    CylinderRecord, DocumentOptions, FeatureDocument, FeatureKind, FeatureRegistry, PlaneRecord,
    RegistryError,
};
pub use selection::{FaceSummary, SelectionError, describe_face, on_faces_selected};
pub use tag::{ROUGHNESS_DECIMALS, TagError, ToleranceTag, parse_tag};
