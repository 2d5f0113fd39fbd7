//! Feature registry
//!
//! Collects recognized planes and cylinders, deduplicated by their raw
//! (unrounded) geometry, under 1-based indices assigned in discovery order.
//! The registry is append-only: entries are never removed or changed.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{Classification, Cylinder, Plane, RawKey, SurfaceDescriptor};

/// Registry serialization errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of a registered feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Plane,
    Cylinder,
}

/// Options for the persisted document
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentOptions {
    /// Also persist cylinder radii (omitted by default)
    pub include_cylinder_radius: bool,
}

/// Identity list: exact equality on the six raw scalars
#[derive(Debug, Default)]
struct IdentityIndex {
    indices: HashMap<[u64; 6], u32>,
}

impl IdentityIndex {
    /// Bit pattern of the key; `-0.0` and `0.0` compare equal
    fn bits(key: &RawKey) -> [u64; 6] {
        key.map(|v| (v + 0.0).to_bits())
    }

    fn get(&self, key: &RawKey) -> Option<u32> {
        self.indices.get(&Self::bits(key)).copied()
    }

    fn insert(&mut self, key: &RawKey, index: u32) {
        self.indices.insert(Self::bits(key), index);
    }
}

/// Planes and cylinders discovered so far
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    plane_keys: IdentityIndex,
    cylinder_keys: IdentityIndex,
    planes: BTreeMap<u32, Plane>,
    cylinders: BTreeMap<u32, Cylinder>,
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plane, returning its index (existing one if already known)
    pub fn register_plane(&mut self, raw: RawKey, plane: Plane) -> u32 {
        if let Some(index) = self.plane_keys.get(&raw) {
            return index;
        }
        let index = self.planes.len() as u32 + 1;
        self.plane_keys.insert(&raw, index);
        self.planes.insert(index, plane);
        index
    }

    /// Register a cylinder, returning its index (existing one if already known)
    pub fn register_cylinder(&mut self, raw: RawKey, cylinder: Cylinder) -> u32 {
        if let Some(index) = self.cylinder_keys.get(&raw) {
            return index;
        }
        let index = self.cylinders.len() as u32 + 1;
        self.cylinder_keys.insert(&raw, index);
        self.cylinders.insert(index, cylinder);
        index
    }

    /// Register a classified face; unrecognized faces are ignored
    pub fn register(&mut self, classification: &Classification) -> Option<(FeatureKind, u32)> {
        let raw = classification.raw_key?;
        match &classification.descriptor {
            SurfaceDescriptor::Plane(plane) => {
                Some((FeatureKind::Plane, self.register_plane(raw, *plane)))
            }
            SurfaceDescriptor::Cylinder(cylinder) => {
                Some((FeatureKind::Cylinder, self.register_cylinder(raw, *cylinder)))
            }
            SurfaceDescriptor::Unrecognized { .. } => None,
        }
    }

    pub fn planes(&self) -> &BTreeMap<u32, Plane> {
        &self.planes
    }

    pub fn cylinders(&self) -> &BTreeMap<u32, Cylinder> {
        &self.cylinders
    }

    pub fn plane(&self, index: u32) -> Option<&Plane> {
        self.planes.get(&index)
    }

    pub fn cylinder(&self, index: u32) -> Option<&Cylinder> {
        self.cylinders.get(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty() && self.cylinders.is_empty()
    }

    /// Build the persisted form of the registry
    pub fn to_document(&self, options: &DocumentOptions) -> FeatureDocument {
        FeatureDocument {
            planes: self
                .planes
                .iter()
                .map(|(&i, p)| {
                    (
                        i,
                        PlaneRecord {
                            location: p.location,
                            normal: p.normal,
                        },
                    )
                })
                .collect(),
            cylinders: self
                .cylinders
                .iter()
                .map(|(&i, c)| {
                    (
                        i,
                        CylinderRecord {
                            location: c.location,
                            axis: c.axis,
                            radius: options.include_cylinder_radius.then_some(c.radius),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Write the registry as `features.json`-style JSON
    pub fn write_json(
        &self,
        path: impl AsRef<Path>,
        options: &DocumentOptions,
    ) -> Result<(), RegistryError> {
        self.to_document(options).save(path)
    }
}

/// Persisted plane entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneRecord {
    pub location: DVec3,
    pub normal: DVec3,
}

/// Persisted cylinder entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderRecord {
    pub location: DVec3,
    pub axis: DVec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// The `features.json` document: both maps are always present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDocument {
    pub planes: BTreeMap<u32, PlaneRecord>,
    pub cylinders: BTreeMap<u32, CylinderRecord>,
}

impl FeatureDocument {
    /// Serialize with 4-space indentation
    pub fn to_json_string(&self) -> Result<String, RegistryError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn write_to(&self, writer: impl Write) -> Result<(), RegistryError> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut ser)?;
        Ok(())
    }

    /// Write the document to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut writer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a document written by [`FeatureDocument::save`]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
