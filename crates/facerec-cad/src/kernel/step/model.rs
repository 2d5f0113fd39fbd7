//! Entity table of a parsed STEP file and the geometry queries the kernel
//! needs: root solid, face list, topology counts, surfaces, placements and
//! the declared length unit.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec3;

use super::p21::{EntityInstance, StepValue};
use crate::kernel::{CadError, CadResult, SurfaceType, TopologyCounts};

const SOLID_TYPES: &[&str] = &[
    "MANIFOLD_SOLID_BREP",
    "BREP_WITH_VOIDS",
    "FACETED_BREP",
    "SHELL_BASED_SURFACE_MODEL",
];

const SHELL_TYPES: &[&str] = &["CLOSED_SHELL", "OPEN_SHELL", "ORIENTED_CLOSED_SHELL"];

const FACE_TYPES: &[&str] = &["ADVANCED_FACE", "FACE_SURFACE"];

const WIRE_TYPES: &[&str] = &["EDGE_LOOP", "POLY_LOOP", "VERTEX_LOOP"];

/// Reversed use of a face inside a shell: `ORIENTED_FACE(name, *, face, orientation)`
const ORIENTED_FACE: &str = "ORIENTED_FACE";

/// Parsed entities keyed by instance id, plus file order.
pub struct StepModel {
    entities: HashMap<u64, EntityInstance>,
    order: Vec<u64>,
}

impl StepModel {
    pub fn new(instances: Vec<EntityInstance>) -> Self {
        let order = instances.iter().map(|e| e.id).collect();
        let entities = instances.into_iter().map(|e| (e.id, e)).collect();
        Self { entities, order }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn get(&self, id: u64) -> CadResult<&EntityInstance> {
        self.entities
            .get(&id)
            .ok_or_else(|| CadError::StepImport(format!("dangling reference #{}", id)))
    }

    fn in_file_order(&self) -> impl Iterator<Item = &EntityInstance> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// First solid-like shape in file order (the transferred root)
    pub fn root_solid(&self) -> Option<u64> {
        self.in_file_order()
            .find(|e| SOLID_TYPES.contains(&e.type_name()))
            .map(|e| e.id)
    }

    /// Faces of `root` in shell order, without duplicates.
    ///
    /// Without a root, every face instance of the file is returned in file order.
    pub fn faces(&self, root: Option<u64>) -> Vec<u64> {
        let Some(root) = root else {
            return self
                .in_file_order()
                .filter(|e| FACE_TYPES.contains(&e.type_name()))
                .map(|e| e.id)
                .collect();
        };

        let mut faces = Vec::new();
        let mut seen = HashSet::new();
        self.collect_faces(root, &mut faces, &mut seen);
        faces
    }

    fn collect_faces(&self, id: u64, faces: &mut Vec<u64>, seen: &mut HashSet<u64>) {
        if !seen.insert(id) {
            return;
        }
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        let type_name = entity.type_name();

        if FACE_TYPES.contains(&type_name) {
            faces.push(id);
        } else if type_name == ORIENTED_FACE {
            if let Some(face) = entity.params().get(2).and_then(StepValue::as_reference) {
                self.collect_faces(face, faces, seen);
            }
        } else if SOLID_TYPES.contains(&type_name) || SHELL_TYPES.contains(&type_name) {
            let mut refs = Vec::new();
            for param in entity.params() {
                param.references(&mut refs);
            }
            for child in refs {
                self.collect_faces(child, faces, seen);
            }
        }
    }

    /// Count vertices, faces and wires reachable from the given faces
    pub fn topology_counts(&self, faces: &[u64]) -> TopologyCounts {
        let mut counts = TopologyCounts::default();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut queue: VecDeque<u64> = faces.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let Some(entity) = self.entities.get(&id) else {
                continue;
            };
            let type_name = entity.type_name();
            if FACE_TYPES.contains(&type_name) {
                counts.faces += 1;
            } else if WIRE_TYPES.contains(&type_name) {
                counts.wires += 1;
            } else if type_name == "VERTEX_POINT" {
                counts.vertices += 1;
                // Vertex geometry holds nothing countable
                continue;
            }

            let mut refs = Vec::new();
            for record in &entity.records {
                for param in &record.params {
                    param.references(&mut refs);
                }
            }
            queue.extend(refs.into_iter().filter(|r| !seen.contains(r)));
        }

        counts
    }

    /// Name attribute of a face instance
    pub fn face_label(&self, face: u64) -> CadResult<Option<String>> {
        let entity = self.get(face)?;
        Ok(entity
            .params()
            .first()
            .and_then(StepValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    /// Surface instance underlying a face
    pub fn face_surface(&self, face: u64) -> CadResult<&EntityInstance> {
        let entity = self.get(face)?;
        let surface = entity
            .params()
            .get(2)
            .and_then(StepValue::as_reference)
            .ok_or_else(|| {
                CadError::StepImport(format!("#{} has no face geometry", face))
            })?;
        self.get(surface)
    }

    /// Analytic surface type of a surface instance
    pub fn surface_type(&self, surface: &EntityInstance) -> SurfaceType {
        let has = |name: &str| surface.has_type(name);

        if has("PLANE") {
            SurfaceType::Plane
        } else if has("CYLINDRICAL_SURFACE") {
            SurfaceType::Cylinder
        } else if has("CONICAL_SURFACE") {
            SurfaceType::Cone
        } else if has("SPHERICAL_SURFACE") {
            SurfaceType::Sphere
        } else if has("TOROIDAL_SURFACE") || has("DEGENERATE_TOROIDAL_SURFACE") {
            SurfaceType::Torus
        } else if has("BEZIER_SURFACE") {
            SurfaceType::BezierSurface
        } else if surface
            .records
            .iter()
            .any(|r| r.type_name.starts_with("B_SPLINE_SURFACE"))
        {
            SurfaceType::BSplineSurface
        } else if has("SURFACE_OF_REVOLUTION") {
            SurfaceType::SurfaceOfRevolution
        } else if has("SURFACE_OF_LINEAR_EXTRUSION") {
            SurfaceType::SurfaceOfExtrusion
        } else if has("OFFSET_SURFACE") {
            SurfaceType::OffsetSurface
        } else {
            SurfaceType::Other(surface.type_name().to_string())
        }
    }

    /// Location and unit axis of an AXIS2_PLACEMENT_3D
    pub fn placement(&self, id: u64) -> CadResult<(DVec3, DVec3)> {
        let entity = self.get(id)?;
        if entity.type_name() != "AXIS2_PLACEMENT_3D" {
            return Err(CadError::StepImport(format!(
                "#{} is a {}, expected AXIS2_PLACEMENT_3D",
                id,
                entity.type_name()
            )));
        }
        let params = entity.params();

        let location = params
            .get(1)
            .and_then(StepValue::as_reference)
            .ok_or_else(|| CadError::StepImport(format!("#{} has no location", id)))
            .and_then(|p| self.triple(p, "CARTESIAN_POINT"))?;

        let axis = match params.get(2).and_then(StepValue::as_reference) {
            Some(d) => self.direction(d)?,
            None => DVec3::Z,
        };

        Ok((location, axis))
    }

    /// Unit vector of a DIRECTION
    pub fn direction(&self, id: u64) -> CadResult<DVec3> {
        let raw = self.triple(id, "DIRECTION")?;
        raw.try_normalize()
            .ok_or_else(|| CadError::DegenerateGeometry(format!("#{} is a zero direction", id)))
    }

    /// Coordinates of a CARTESIAN_POINT or DIRECTION (missing z reads as 0)
    fn triple(&self, id: u64, expected: &str) -> CadResult<DVec3> {
        let entity = self.get(id)?;
        if entity.type_name() != expected {
            return Err(CadError::StepImport(format!(
                "#{} is a {}, expected {}",
                id,
                entity.type_name(),
                expected
            )));
        }
        let coords: Vec<f64> = entity
            .params()
            .get(1)
            .and_then(StepValue::as_list)
            .map(|items| items.iter().filter_map(StepValue::as_f64).collect())
            .unwrap_or_default();

        match coords.as_slice() {
            [x, y, z, ..] => Ok(DVec3::new(*x, *y, *z)),
            [x, y] => Ok(DVec3::new(*x, *y, 0.0)),
            _ => Err(CadError::StepImport(format!(
                "#{} has no coordinate list",
                id
            ))),
        }
    }

    /// Millimetres per length unit of the representation holding `root`.
    ///
    /// Falls back to the first declared length unit, then to 1.0.
    pub fn length_unit_mm(&self, root: Option<u64>) -> f64 {
        root.and_then(|root| self.context_length_unit(root))
            .or_else(|| {
                self.in_file_order()
                    .find(|e| e.has_type("LENGTH_UNIT"))
                    .and_then(|e| self.unit_mm(e, 0))
            })
            .unwrap_or(1.0)
    }

    /// Length unit assigned by the context of the representation listing `item`
    fn context_length_unit(&self, item: u64) -> Option<f64> {
        let representation = self
            .in_file_order()
            .flat_map(|e| e.records.iter())
            .find(|r| {
                r.type_name.ends_with("REPRESENTATION")
                    && r.params
                        .get(1)
                        .and_then(StepValue::as_list)
                        .is_some_and(|items| items.iter().any(|v| v.as_reference() == Some(item)))
            })?;

        let context = representation
            .params
            .get(2)
            .and_then(StepValue::as_reference)
            .and_then(|id| self.entities.get(&id))?;
        let units = context
            .record("GLOBAL_UNIT_ASSIGNED_CONTEXT")?
            .params
            .first()
            .and_then(StepValue::as_list)?;

        units
            .iter()
            .filter_map(StepValue::as_reference)
            .filter_map(|id| self.entities.get(&id))
            .find(|unit| unit.has_type("LENGTH_UNIT"))
            .and_then(|unit| self.unit_mm(unit, 0))
    }

    fn unit_mm(&self, unit: &EntityInstance, depth: usize) -> Option<f64> {
        if depth > 8 {
            return None;
        }

        if let Some(si) = unit.record("SI_UNIT") {
            let prefix = si.params.first().and_then(StepValue::as_enum);
            let name = si.params.get(1).and_then(StepValue::as_enum);
            if name != Some("METRE") {
                return None;
            }
            return Some(match prefix {
                None => 1000.0,
                Some("KILO") => 1.0e6,
                Some("DECI") => 100.0,
                Some("CENTI") => 10.0,
                Some("MILLI") => 1.0,
                Some("MICRO") => 1.0e-3,
                Some("NANO") => 1.0e-6,
                Some(_) => return None,
            });
        }

        let conversion = unit.record("CONVERSION_BASED_UNIT")?;
        let factor = conversion
            .params
            .get(1)
            .and_then(StepValue::as_reference)
            .and_then(|id| self.entities.get(&id))
            .and_then(|measure| {
                let value = measure.params().first()?.as_f64()?;
                let base = measure.params().get(1)?.as_reference()?;
                let base = self.entities.get(&base)?;
                Some(value * self.unit_mm(base, depth + 1)?)
            });

        factor.or_else(|| {
            match conversion
                .params
                .first()
                .and_then(StepValue::as_str)
                .map(|s| s.to_ascii_uppercase())
                .as_deref()
            {
                Some("INCH") => Some(25.4),
                Some("FOOT") => Some(304.8),
                _ => None,
            }
        })
    }
}
