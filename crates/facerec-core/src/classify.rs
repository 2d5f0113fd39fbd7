//! Face classification
//!
//! Maps a face to a planar, cylindrical or unrecognized surface descriptor.
//! Geometry is rounded to [`GEOMETRY_DECIMALS`] places for storage and display;
//! the unrounded values are kept as the identity key for deduplication.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use facerec_cad::{CadKernel, CadResult, CylinderParams, FaceId, PlaneParams, SurfaceType};

/// Decimal places kept for locations, directions and radii
pub const GEOMETRY_DECIMALS: i32 = 2;

/// The six unrounded scalars identifying a surface:
/// location xyz followed by normal/axis xyz
pub type RawKey = [f64; 6];

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round_vec(v: DVec3) -> DVec3 {
    DVec3::new(
        round_to(v.x, GEOMETRY_DECIMALS),
        round_to(v.y, GEOMETRY_DECIMALS),
        round_to(v.z, GEOMETRY_DECIMALS),
    )
}

fn raw_key(location: DVec3, direction: DVec3) -> RawKey {
    [
        location.x,
        location.y,
        location.z,
        direction.x,
        direction.y,
        direction.z,
    ]
}

/// A recognized plane (rounded)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub location: DVec3,
    pub normal: DVec3,
}

impl Plane {
    /// Rounded plane and the raw identity key of the kernel parameters
    pub fn from_params(params: &PlaneParams) -> (Self, RawKey) {
        let plane = Self {
            location: round_vec(params.location),
            normal: round_vec(params.normal),
        };
        (plane, raw_key(params.location, params.normal))
    }
}

/// A recognized cylinder (rounded)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub location: DVec3,
    pub axis: DVec3,
    pub radius: f64,
}

impl Cylinder {
    /// Rounded cylinder and the raw identity key of the kernel parameters
    pub fn from_params(params: &CylinderParams) -> (Self, RawKey) {
        let cylinder = Self {
            location: round_vec(params.location),
            axis: round_vec(params.axis),
            radius: round_to(params.radius, GEOMETRY_DECIMALS),
        };
        (cylinder, raw_key(params.location, params.axis))
    }
}

/// Geometric description of a face
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceDescriptor {
    Plane(Plane),
    Cylinder(Cylinder),
    /// Surface type outside the recognized set; no parameters extracted
    Unrecognized { raw_type: SurfaceType },
}

impl SurfaceDescriptor {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, SurfaceDescriptor::Unrecognized { .. })
    }
}

/// Result of classifying one face
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub face: FaceId,
    pub descriptor: SurfaceDescriptor,
    /// Unrounded identity key, present for planes and cylinders
    pub raw_key: Option<RawKey>,
}

/// Classify a face through the kernel.
///
/// Kernel faults are returned unchanged; an unsupported surface type is not
/// an error and only emits a notice.
pub fn classify(kernel: &dyn CadKernel, face: FaceId) -> CadResult<Classification> {
    let surface_type = kernel.surface_type(face)?;

    let (descriptor, raw_key) = match surface_type {
        SurfaceType::Plane => {
            let (plane, key) = Plane::from_params(&kernel.plane(face)?);
            (SurfaceDescriptor::Plane(plane), Some(key))
        }
        SurfaceType::Cylinder => {
            let (cylinder, key) = Cylinder::from_params(&kernel.cylinder(face)?);
            (SurfaceDescriptor::Cylinder(cylinder), Some(key))
        }
        raw_type => {
            tracing::info!("{}: {} not implemented", face, raw_type);
            (SurfaceDescriptor::Unrecognized { raw_type }, None)
        }
    };

    Ok(Classification {
        face,
        descriptor,
        raw_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use facerec_cad::{MemoryFace, MemoryKernel};

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.2345, 3), 1.235);
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(-0.004, 2), 0.0);
        assert_eq!(round_to(0.70710678, 2), 0.71);
    }

    #[test]
    fn test_round_to_exact_ties_go_away_from_zero() {
        assert_eq!(round_to(12.125, 2), 12.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(0.0625, 3), 0.063);
    }

    #[test]
    fn test_classify_plane_rounds_but_keeps_raw_key() {
        let kernel = MemoryKernel::new();
        let normal = DVec3::new(1.0, 1.0, 0.0).normalize();
        let solid = kernel.add_solid(vec![MemoryFace::plane(
            DVec3::new(1.004, 2.0, 3.456),
            normal,
        )]);

        let result = classify(&kernel, solid.face(0)).unwrap();
        match result.descriptor {
            SurfaceDescriptor::Plane(plane) => {
                assert_eq!(plane.location, DVec3::new(1.0, 2.0, 3.46));
                assert_eq!(plane.normal, DVec3::new(0.71, 0.71, 0.0));
            }
            other => panic!("expected plane, got {:?}", other),
        }
        assert_eq!(
            result.raw_key,
            Some([1.004, 2.0, 3.456, normal.x, normal.y, normal.z])
        );
    }

    #[test]
    fn test_classify_cylinder() {
        let kernel = MemoryKernel::new();
        let solid = kernel.add_solid(vec![MemoryFace::cylinder(
            DVec3::new(5.0, 5.0, 0.0),
            DVec3::Z,
            2.499,
        )]);

        let result = classify(&kernel, solid.face(0)).unwrap();
        let SurfaceDescriptor::Cylinder(cylinder) = result.descriptor else {
            panic!("expected cylinder");
        };
        assert_eq!(cylinder.radius, 2.5);
        assert_eq!(cylinder.axis, DVec3::Z);
        assert!(result.raw_key.is_some());
    }

    #[test]
    fn test_classify_unrecognized() {
        let kernel = MemoryKernel::new();
        let solid = kernel.add_solid(vec![MemoryFace::other(SurfaceType::Torus)]);

        let result = classify(&kernel, solid.face(0)).unwrap();
        assert_eq!(
            result.descriptor,
            SurfaceDescriptor::Unrecognized {
                raw_type: SurfaceType::Torus
            }
        );
        assert!(!result.descriptor.is_recognized());
        assert_eq!(result.raw_key, None);
    }

    #[test]
    fn test_classify_propagates_kernel_fault() {
        let kernel = MemoryKernel::new();
        let solid = kernel.add_solid(vec![MemoryFace::fault("degenerate surface")]);

        assert!(classify(&kernel, solid.face(0)).is_err());
    }
}
