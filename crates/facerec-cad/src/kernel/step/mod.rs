//! Built-in STEP CAD Kernel Backend
//!
//! Pure Rust kernel reading ISO 10303-21 files. It resolves the first root
//! solid, its faces, their analytic surfaces and the face entity names.
//! Coordinates are reported in millimetres.

mod model;
mod p21;

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    CadError, CadKernel, CadResult, CylinderParams, FaceId, PlaneParams, Solid, StepImportOptions,
    SurfaceType, TopologyCounts,
};
use model::StepModel;
use p21::{StepValue, parse_data_section};

/// A transferred solid: the whole entity table plus the face instance ids
struct StepSolid {
    model: StepModel,
    faces: Vec<u64>,
    /// Millimetres per file length unit
    scale: f64,
}

/// STEP-file-based CAD kernel
pub struct StepKernel {
    /// Storage for solid data (keyed by UUID)
    solids: Mutex<HashMap<Uuid, StepSolid>>,
}

impl StepKernel {
    /// Create a new STEP kernel
    pub fn new() -> Self {
        Self {
            solids: Mutex::new(HashMap::new()),
        }
    }

    /// Import STEP data already held in memory
    pub fn import_step_str(&self, text: &str, options: &StepImportOptions) -> CadResult<Solid> {
        let instances = parse_data_section(text).map_err(|e| CadError::StepImport(e.to_string()))?;
        let model = StepModel::new(instances);

        let root = model.root_solid();
        if root.is_none() {
            tracing::warn!("No solid found in STEP data, using all faces");
        }
        let faces = model.faces(root);
        if faces.is_empty() {
            return Err(CadError::StepImport("no faces found".into()));
        }

        let scale = options
            .length_unit
            .millimetres()
            .unwrap_or_else(|| model.length_unit_mm(root));

        tracing::debug!(
            "Transferred STEP root {:?}: {} entities, {} faces, {} mm per unit",
            root,
            model.len(),
            faces.len(),
            scale
        );

        Ok(self.store_solid(StepSolid {
            model,
            faces,
            scale,
        }))
    }

    /// Store a solid and return a Solid reference
    fn store_solid(&self, solid: StepSolid) -> Solid {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, solid);
        Solid::new(id)
    }

    fn with_solid<T>(&self, id: Uuid, f: impl FnOnce(&StepSolid) -> CadResult<T>) -> CadResult<T> {
        let solids = self.solids.lock();
        let solid = solids.get(&id).ok_or(CadError::SolidNotFound(id))?;
        f(solid)
    }

    /// Run `f` with the solid and the face's entity id
    fn with_face<T>(
        &self,
        face: FaceId,
        f: impl FnOnce(&StepSolid, u64) -> CadResult<T>,
    ) -> CadResult<T> {
        self.with_solid(face.solid_id, |solid| {
            let entity = solid
                .faces
                .get(face.index as usize)
                .copied()
                .ok_or(CadError::FaceNotFound(face))?;
            f(solid, entity)
        })
    }
}

impl Default for StepKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl CadKernel for StepKernel {
    fn name(&self) -> &str {
        "step"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn import_step(&self, path: &Path, options: &StepImportOptions) -> CadResult<Solid> {
        let bytes = std::fs::read(path)
            .map_err(|e| CadError::FileIo(format!("{}: {}", path.display(), e)))?;
        let solid = self.import_step_str(&decode_text(bytes), options)?;
        tracing::info!("Loaded STEP file {:?}", path);
        Ok(solid)
    }

    fn faces(&self, solid: &Solid) -> CadResult<Vec<FaceId>> {
        self.with_solid(solid.id, |data| {
            Ok((0..data.faces.len() as u32).map(|i| solid.face(i)).collect())
        })
    }

    fn topology_counts(&self, solid: &Solid) -> CadResult<TopologyCounts> {
        self.with_solid(solid.id, |data| Ok(data.model.topology_counts(&data.faces)))
    }

    fn surface_type(&self, face: FaceId) -> CadResult<SurfaceType> {
        self.with_face(face, |solid, entity| {
            let surface = solid.model.face_surface(entity)?;
            Ok(solid.model.surface_type(surface))
        })
    }

    fn plane(&self, face: FaceId) -> CadResult<PlaneParams> {
        self.with_face(face, |solid, entity| {
            let surface = solid.model.face_surface(entity)?;
            let actual = solid.model.surface_type(surface);
            if actual != SurfaceType::Plane {
                return Err(CadError::SurfaceMismatch {
                    face,
                    expected: SurfaceType::Plane,
                    actual,
                });
            }

            let position = placement_ref(surface.params(), surface.id)?;
            let (location, normal) = solid.model.placement(position)?;
            Ok(PlaneParams {
                location: location * solid.scale,
                normal,
            })
        })
    }

    fn cylinder(&self, face: FaceId) -> CadResult<CylinderParams> {
        self.with_face(face, |solid, entity| {
            let surface = solid.model.face_surface(entity)?;
            let actual = solid.model.surface_type(surface);
            if actual != SurfaceType::Cylinder {
                return Err(CadError::SurfaceMismatch {
                    face,
                    expected: SurfaceType::Cylinder,
                    actual,
                });
            }

            let params = surface.params();
            let position = placement_ref(params, surface.id)?;
            let radius = params
                .get(2)
                .and_then(StepValue::as_f64)
                .ok_or_else(|| CadError::StepImport(format!("#{} has no radius", surface.id)))?;
            if radius <= 0.0 {
                return Err(CadError::DegenerateGeometry(format!(
                    "#{} has radius {}",
                    surface.id, radius
                )));
            }

            let (location, axis) = solid.model.placement(position)?;
            Ok(CylinderParams {
                location: location * solid.scale,
                axis,
                radius: radius * solid.scale,
            })
        })
    }

    fn entity_label(&self, face: FaceId) -> CadResult<Option<String>> {
        self.with_face(face, |solid, entity| solid.model.face_label(entity))
    }
}

/// File text as UTF-8, or as ISO 8859-1 when the bytes are not valid UTF-8
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("STEP file is not UTF-8, reading it as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

/// Placement reference of an elementary surface (`NAME(label, position, ..)`)
fn placement_ref(params: &[StepValue], surface: u64) -> CadResult<u64> {
    params
        .get(1)
        .and_then(StepValue::as_reference)
        .ok_or_else(|| CadError::StepImport(format!("#{} has no placement", surface)))
}
