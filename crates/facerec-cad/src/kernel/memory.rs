//! In-memory CAD Kernel Backend
//!
//! Holds solids described directly as lists of faces with canned surfaces.
//! Used to drive recognition without a STEP file.

use std::collections::HashMap;
use std::path::Path;

use glam::DVec3;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    CadError, CadKernel, CadResult, CylinderParams, FaceId, PlaneParams, Solid, StepImportOptions,
    SurfaceType, TopologyCounts,
};

/// Surface attached to an in-memory face
#[derive(Debug, Clone, PartialEq)]
pub enum MemorySurface {
    Plane(PlaneParams),
    Cylinder(CylinderParams),
    /// A surface type without extractable parameters
    Other(SurfaceType),
    /// Every query on this face fails with the given message
    Fault(String),
}

/// A face of an in-memory solid
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryFace {
    pub surface: MemorySurface,
    pub label: Option<String>,
}

impl MemoryFace {
    /// Planar face through `location` with the given normal
    pub fn plane(location: DVec3, normal: DVec3) -> Self {
        Self {
            surface: MemorySurface::Plane(PlaneParams { location, normal }),
            label: None,
        }
    }

    /// Cylindrical face around the axis through `location`
    pub fn cylinder(location: DVec3, axis: DVec3, radius: f64) -> Self {
        Self {
            surface: MemorySurface::Cylinder(CylinderParams {
                location,
                axis,
                radius,
            }),
            label: None,
        }
    }

    /// Face whose surface is of another analytic type
    pub fn other(surface_type: SurfaceType) -> Self {
        Self {
            surface: MemorySurface::Other(surface_type),
            label: None,
        }
    }

    /// Face on which every kernel query fails
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            surface: MemorySurface::Fault(message.into()),
            label: None,
        }
    }

    /// Attach an entity label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

struct MemorySolid {
    faces: Vec<MemoryFace>,
    counts: Option<TopologyCounts>,
}

/// In-memory CAD kernel
#[derive(Default)]
pub struct MemoryKernel {
    /// Storage for solid data (keyed by UUID)
    solids: Mutex<HashMap<Uuid, MemorySolid>>,
}

impl MemoryKernel {
    /// Create a new, empty kernel
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a solid made of `faces` and return a Solid reference
    pub fn add_solid(&self, faces: Vec<MemoryFace>) -> Solid {
        self.store(faces, None)
    }

    /// Store a solid with explicit vertex/face/wire counts
    pub fn add_solid_with_counts(&self, faces: Vec<MemoryFace>, counts: TopologyCounts) -> Solid {
        self.store(faces, Some(counts))
    }

    fn store(&self, faces: Vec<MemoryFace>, counts: Option<TopologyCounts>) -> Solid {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, MemorySolid { faces, counts });
        Solid::new(id)
    }

    fn with_face<T>(
        &self,
        face: FaceId,
        f: impl FnOnce(&MemoryFace) -> CadResult<T>,
    ) -> CadResult<T> {
        let solids = self.solids.lock();
        let solid = solids
            .get(&face.solid_id)
            .ok_or(CadError::SolidNotFound(face.solid_id))?;
        let data = solid
            .faces
            .get(face.index as usize)
            .ok_or(CadError::FaceNotFound(face))?;
        if let MemorySurface::Fault(message) = &data.surface {
            return Err(CadError::OperationFailed(message.clone()));
        }
        f(data)
    }
}

fn surface_type_of(surface: &MemorySurface) -> SurfaceType {
    match surface {
        MemorySurface::Plane(_) => SurfaceType::Plane,
        MemorySurface::Cylinder(_) => SurfaceType::Cylinder,
        MemorySurface::Other(surface_type) => surface_type.clone(),
        MemorySurface::Fault(_) => SurfaceType::Other("FAULT".into()),
    }
}

impl CadKernel for MemoryKernel {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn import_step(&self, path: &Path, _options: &StepImportOptions) -> CadResult<Solid> {
        Err(CadError::OperationFailed(format!(
            "STEP import is not supported by the memory kernel ({})",
            path.display()
        )))
    }

    fn faces(&self, solid: &Solid) -> CadResult<Vec<FaceId>> {
        let solids = self.solids.lock();
        let data = solids
            .get(&solid.id)
            .ok_or(CadError::SolidNotFound(solid.id))?;
        Ok((0..data.faces.len() as u32).map(|i| solid.face(i)).collect())
    }

    fn topology_counts(&self, solid: &Solid) -> CadResult<TopologyCounts> {
        let solids = self.solids.lock();
        let data = solids
            .get(&solid.id)
            .ok_or(CadError::SolidNotFound(solid.id))?;
        Ok(data.counts.unwrap_or(TopologyCounts {
            vertices: 0,
            faces: data.faces.len(),
            wires: data.faces.len(),
        }))
    }

    fn surface_type(&self, face: FaceId) -> CadResult<SurfaceType> {
        self.with_face(face, |data| Ok(surface_type_of(&data.surface)))
    }

    fn plane(&self, face: FaceId) -> CadResult<PlaneParams> {
        self.with_face(face, |data| match &data.surface {
            MemorySurface::Plane(params) => Ok(*params),
            other => Err(CadError::SurfaceMismatch {
                face,
                expected: SurfaceType::Plane,
                actual: surface_type_of(other),
            }),
        })
    }

    fn cylinder(&self, face: FaceId) -> CadResult<CylinderParams> {
        self.with_face(face, |data| match &data.surface {
            MemorySurface::Cylinder(params) => Ok(*params),
            other => Err(CadError::SurfaceMismatch {
                face,
                expected: SurfaceType::Cylinder,
                actual: surface_type_of(other),
            }),
        })
    }

    fn entity_label(&self, face: FaceId) -> CadResult<Option<String>> {
        self.with_face(face, |data| Ok(data.label.clone()))
    }
}
