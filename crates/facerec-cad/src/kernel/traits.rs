//! CAD Kernel trait definitions
//!
//! These traits define the interface that all CAD kernels must implement.
//! The recognition layer only ever talks to a kernel through this trait, so a
//! backend can be swapped for a fake one in tests.

use std::fmt;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a face within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId {
    /// ID of the solid this face belongs to
    pub solid_id: Uuid,
    /// Index of the face within the solid
    pub index: u32,
}

impl FaceId {
    /// Create a new face ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face #{}", self.index + 1)
    }
}

/// A 3D solid body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
}

impl Solid {
    /// Create a new solid with the given ID
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }

    /// Handle for the face at `index` (zero-based)
    pub fn face(&self, index: u32) -> FaceId {
        FaceId::new(self.id, index)
    }
}

/// Analytic type of the surface underlying a face
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    BezierSurface,
    BSplineSurface,
    SurfaceOfRevolution,
    SurfaceOfExtrusion,
    OffsetSurface,
    /// Any surface the kernel has no dedicated tag for (raw entity name)
    Other(String),
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceType::Plane => write!(f, "plane"),
            SurfaceType::Cylinder => write!(f, "cylinder"),
            SurfaceType::Cone => write!(f, "cone"),
            SurfaceType::Sphere => write!(f, "sphere"),
            SurfaceType::Torus => write!(f, "torus"),
            SurfaceType::BezierSurface => write!(f, "bezier surface"),
            SurfaceType::BSplineSurface => write!(f, "b-spline surface"),
            SurfaceType::SurfaceOfRevolution => write!(f, "surface of revolution"),
            SurfaceType::SurfaceOfExtrusion => write!(f, "surface of extrusion"),
            SurfaceType::OffsetSurface => write!(f, "offset surface"),
            SurfaceType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Unrounded parameters of a planar surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneParams {
    /// A point of the plane (placement origin)
    pub location: DVec3,
    /// Unit normal of the plane (placement axis, independent of face orientation)
    pub normal: DVec3,
}

/// Unrounded parameters of a cylindrical surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderParams {
    /// A point of the cylinder axis
    pub location: DVec3,
    /// Unit direction of the cylinder axis
    pub axis: DVec3,
    /// Cylinder radius
    pub radius: f64,
}

/// Topology counts of a solid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyCounts {
    pub vertices: usize,
    pub faces: usize,
    pub wires: usize,
}

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("STEP import failed: {0}")]
    StepImport(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),

    #[error("Face not found: {0}")]
    FaceNotFound(FaceId),

    #[error("Surface of {face} is a {actual}, not a {expected}")]
    SurfaceMismatch {
        face: FaceId,
        expected: SurfaceType,
        actual: SurfaceType,
    },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// Length unit used to interpret the coordinates of an imported file
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Use the unit declared in the file
    #[default]
    FromFile,
    Millimetre,
    Centimetre,
    Metre,
    Inch,
}

impl LengthUnit {
    /// Millimetres per unit, or `None` when the file decides
    pub fn millimetres(&self) -> Option<f64> {
        match self {
            LengthUnit::FromFile => None,
            LengthUnit::Millimetre => Some(1.0),
            LengthUnit::Centimetre => Some(10.0),
            LengthUnit::Metre => Some(1000.0),
            LengthUnit::Inch => Some(25.4),
        }
    }
}

/// Options for STEP file import
#[derive(Debug, Clone, Default)]
pub struct StepImportOptions {
    /// Force a length unit instead of the one declared in the file.
    /// Coordinates are always reported in millimetres.
    pub length_unit: LengthUnit,
}

/// The main CAD kernel trait
///
/// Implementations of this trait provide STEP loading and face queries
/// using different backends (built-in STEP reader, in-memory fixtures, etc.)
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Import a STEP file and transfer its first root solid
    ///
    /// # Arguments
    /// * `path` - Path to the STEP file
    /// * `options` - Import options
    fn import_step(&self, path: &Path, options: &StepImportOptions) -> CadResult<Solid>;

    /// Get all faces of a solid, in stable enumeration order
    fn faces(&self, solid: &Solid) -> CadResult<Vec<FaceId>>;

    /// Count the vertices, faces and wires of a solid
    fn topology_counts(&self, solid: &Solid) -> CadResult<TopologyCounts>;

    /// Analytic type of the surface underlying a face
    fn surface_type(&self, face: FaceId) -> CadResult<SurfaceType>;

    /// Parameters of a planar face
    ///
    /// Fails with [`CadError::SurfaceMismatch`] if the face is not planar.
    fn plane(&self, face: FaceId) -> CadResult<PlaneParams>;

    /// Parameters of a cylindrical face
    ///
    /// Fails with [`CadError::SurfaceMismatch`] if the face is not cylindrical.
    fn cylinder(&self, face: FaceId) -> CadResult<CylinderParams>;

    /// Name of the STEP entity the face was transferred from, if any
    fn entity_label(&self, face: FaceId) -> CadResult<Option<String>>;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelNotAvailable("No CAD kernel available".into()))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn import_step(&self, _path: &Path, _options: &StepImportOptions) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available for STEP import".into(),
        ))
    }

    fn faces(&self, _solid: &Solid) -> CadResult<Vec<FaceId>> {
        Self::unavailable()
    }

    fn topology_counts(&self, _solid: &Solid) -> CadResult<TopologyCounts> {
        Self::unavailable()
    }

    fn surface_type(&self, _face: FaceId) -> CadResult<SurfaceType> {
        Self::unavailable()
    }

    fn plane(&self, _face: FaceId) -> CadResult<PlaneParams> {
        Self::unavailable()
    }

    fn cylinder(&self, _face: FaceId) -> CadResult<CylinderParams> {
        Self::unavailable()
    }

    fn entity_label(&self, _face: FaceId) -> CadResult<Option<String>> {
        Self::unavailable()
    }
}

/// Get the default CAD kernel based on available features
pub fn default_kernel() -> Box<dyn CadKernel> {
    #[cfg(feature = "step")]
    {
        Box::new(super::StepKernel::new())
    }

    #[cfg(not(feature = "step"))]
    {
        Box::new(NullKernel)
    }
}
