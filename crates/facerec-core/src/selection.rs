//! Face selection handling
//!
//! Describes clicked faces for the operator: the recognized feature kind,
//! the hole radius for cylinders and the tolerance tag from the face label.
//! Nothing here touches a [`FeatureRegistry`](crate::FeatureRegistry).

use std::fmt;

use thiserror::Error;

use facerec_cad::{CadError, CadKernel, FaceId};

use crate::classify::{SurfaceDescriptor, classify};
use crate::tag::{TagError, ToleranceTag, parse_tag};

/// Human-readable summary of one selected face
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSummary {
    Plane {
        face: FaceId,
        tag: ToleranceTag,
    },
    Hole {
        face: FaceId,
        radius: f64,
        tag: ToleranceTag,
    },
}

impl FaceSummary {
    pub fn face(&self) -> FaceId {
        match self {
            FaceSummary::Plane { face, .. } | FaceSummary::Hole { face, .. } => *face,
        }
    }

    pub fn tag(&self) -> &ToleranceTag {
        match self {
            FaceSummary::Plane { tag, .. } | FaceSummary::Hole { tag, .. } => tag,
        }
    }
}

impl fmt::Display for FaceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceSummary::Plane { tag, .. } => write!(
                f,
                "Feature is a plane, tolerance IT{}, surface roughness Ra{}",
                tag.it_grade, tag.roughness
            ),
            FaceSummary::Hole { radius, tag, .. } => write!(
                f,
                "Feature is a hole, radius {}, tolerance IT{}, surface roughness Ra{}",
                radius, tag.it_grade, tag.roughness
            ),
        }
    }
}

/// Reasons a selected face is not described
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("{0} has no entity label")]
    MissingLabel(FaceId),

    #[error("{face}: {source}")]
    Tag {
        face: FaceId,
        #[source]
        source: TagError,
    },

    #[error(transparent)]
    Kernel(#[from] CadError),
}

/// Describe a single face.
///
/// Returns `Ok(None)` for surfaces that are neither planes nor cylinders.
pub fn describe_face(
    kernel: &dyn CadKernel,
    face: FaceId,
) -> Result<Option<FaceSummary>, SelectionError> {
    let label = kernel
        .entity_label(face)?
        .ok_or(SelectionError::MissingLabel(face))?;
    let tag = parse_tag(&label).map_err(|source| SelectionError::Tag { face, source })?;

    let summary = match classify(kernel, face)?.descriptor {
        SurfaceDescriptor::Plane(_) => Some(FaceSummary::Plane { face, tag }),
        SurfaceDescriptor::Cylinder(cylinder) => Some(FaceSummary::Hole {
            face,
            radius: cylinder.radius,
            tag,
        }),
        SurfaceDescriptor::Unrecognized { .. } => None,
    };
    Ok(summary)
}

/// Selection callback: describe every selected face, skipping faces that
/// cannot be described
pub fn on_faces_selected(kernel: &dyn CadKernel, faces: &[FaceId]) -> Vec<FaceSummary> {
    faces
        .iter()
        .filter_map(|&face| match describe_face(kernel, face) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Skipping selected {}: {}", face, e);
                None
            }
        })
        .collect()
}
