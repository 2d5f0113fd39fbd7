//! Batch traversal
//!
//! Walks every face of a solid in the kernel's enumeration order, classifies
//! it and registers planes and cylinders into a fresh [`FeatureRegistry`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use facerec_cad::{CadError, CadKernel, FaceId, Solid, TopologyCounts};

use crate::classify::classify;
use crate::registry::{FeatureRegistry, RegistryError};

/// What to do when the kernel fails on a single face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaultPolicy {
    /// Log a warning, skip the face and keep going
    #[default]
    SkipAndLog,
    /// Stop the batch at the first faulty face
    Abort,
}

/// Batch options
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub fault_policy: FaultPolicy,
}

/// Batch errors
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Kernel error: {0}")]
    Kernel(#[from] CadError),

    #[error("Failed to classify {face}: {source}")]
    FaceFault {
        face: FaceId,
        #[source]
        source: CadError,
    },

    #[error("Failed to write features: {0}")]
    Registry(#[from] RegistryError),
}

pub type BatchResult<T> = Result<T, BatchError>;

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub registry: FeatureRegistry,
    pub counts: TopologyCounts,
    /// Faces visited, including skipped ones
    pub faces: usize,
    /// Faces classified as plane or cylinder (before deduplication)
    pub recognized: usize,
    pub unrecognized: usize,
    /// Faces skipped under [`FaultPolicy::SkipAndLog`]
    pub skipped: Vec<(FaceId, CadError)>,
}

/// Drives classification over all faces of a solid
pub struct BatchDriver<'a> {
    kernel: &'a dyn CadKernel,
    options: BatchOptions,
}

impl<'a> BatchDriver<'a> {
    pub fn new(kernel: &'a dyn CadKernel, options: BatchOptions) -> Self {
        Self { kernel, options }
    }

    /// Classify every face of `solid` and collect the features found
    pub fn run(&self, solid: &Solid) -> BatchResult<BatchReport> {
        let counts = self.kernel.topology_counts(solid)?;
        tracing::info!("number of vertices: {}", counts.vertices);
        tracing::info!("number of faces: {}", counts.faces);
        tracing::info!("number of wires: {}", counts.wires);

        let faces = self.kernel.faces(solid)?;
        let mut report = BatchReport {
            counts,
            faces: faces.len(),
            ..Default::default()
        };

        for face in faces {
            let classification = match classify(self.kernel, face) {
                Ok(classification) => classification,
                Err(source) => match self.options.fault_policy {
                    FaultPolicy::Abort => return Err(BatchError::FaceFault { face, source }),
                    FaultPolicy::SkipAndLog => {
                        tracing::warn!("Skipping {}: {}", face, source);
                        report.skipped.push((face, source));
                        continue;
                    }
                },
            };

            match report.registry.register(&classification) {
                Some((kind, index)) => {
                    report.recognized += 1;
                    tracing::debug!("{} -> {:?} {}", face, kind, index);
                }
                None => {
                    debug_assert!(!classification.descriptor.is_recognized());
                    report.unrecognized += 1;
                }
            }
        }

        tracing::info!(
            "Recognized {} planes and {} cylinders ({} faces unrecognized, {} skipped)",
            report.registry.planes().len(),
            report.registry.cylinders().len(),
            report.unrecognized,
            report.skipped.len()
        );

        Ok(report)
    }
}

/// Run a batch with default options
pub fn run_batch(kernel: &dyn CadKernel, solid: &Solid) -> BatchResult<BatchReport> {
    BatchDriver::new(kernel, BatchOptions::default()).run(solid)
}
