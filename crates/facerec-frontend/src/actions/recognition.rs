//! Batch recognition menu command

use facerec_core::BatchDriver;

use super::ActionContext;

/// Classify every face of the loaded solid and write the features file
pub fn handle_recognition(ctx: &ActionContext) {
    let Some(solid) = ctx.app_state.lock().solid.clone() else {
        tracing::warn!("No model loaded, nothing to recognize");
        return;
    };
    let recognition = &ctx.config.recognition;

    let report = match BatchDriver::new(ctx.kernel, recognition.batch_options()).run(&solid) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Recognition failed: {}", e);
            return;
        }
    };

    let options = recognition.document_options();
    if let Err(e) = report
        .registry
        .write_json(&recognition.output_path, &options)
    {
        tracing::error!(
            "Failed to write {}: {}",
            recognition.output_path.display(),
            e
        );
        return;
    }

    tracing::info!("Wrote {}", recognition.output_path.display());
    println!("File written");
    ctx.app_state.lock().last_features = Some(report.registry.to_document(&options));
}

#[cfg(test)]
mod tests {
    use super::*;
    use facerec_cad::{CadKernel, MemoryFace, MemoryKernel, SurfaceType};
    use facerec_core::FeatureDocument;
    use glam::DVec3;

    use crate::config::AppConfig;
    use crate::state::create_shared_state;

    #[test]
    fn test_recognition_writes_features() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::new();
        config.recognition.output_path = dir.path().join("features.json");

        let kernel = MemoryKernel::new();
        let solid = kernel.add_solid(vec![
            MemoryFace::plane(DVec3::ZERO, DVec3::Z),
            MemoryFace::cylinder(DVec3::ZERO, DVec3::Z, 3.0),
            MemoryFace::other(SurfaceType::Sphere),
        ]);
        let faces = kernel.faces(&solid).unwrap();

        let app_state = create_shared_state();
        app_state
            .lock()
            .set_model("part.step".into(), solid, faces);

        handle_recognition(&ActionContext::new(&app_state, &kernel, &config));

        let written = FeatureDocument::load_json(&config.recognition.output_path).unwrap();
        assert_eq!(written.planes.len(), 1);
        assert_eq!(written.cylinders.len(), 1);
        assert_eq!(app_state.lock().last_features.as_ref(), Some(&written));
    }

    #[test]
    fn test_recognition_without_model_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::new();
        config.recognition.output_path = dir.path().join("features.json");

        let kernel = MemoryKernel::new();
        let app_state = create_shared_state();
        handle_recognition(&ActionContext::new(&app_state, &kernel, &config));

        assert!(!config.recognition.output_path.exists());
        assert!(app_state.lock().last_features.is_none());
    }
}
