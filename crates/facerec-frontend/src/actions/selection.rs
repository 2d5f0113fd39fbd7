//! Face selection and listing

use facerec_core::on_faces_selected;

use super::ActionContext;

/// Describe the picked faces (1-based face numbers)
pub fn handle_select_faces(numbers: &[u32], ctx: &ActionContext) {
    let faces: Vec<_> = {
        let state = ctx.app_state.lock();
        numbers
            .iter()
            .filter_map(|&n| {
                let face = state.face(n);
                if face.is_none() {
                    tracing::warn!("No face #{} (model has {} faces)", n, state.faces.len());
                }
                face
            })
            .collect()
    };

    for summary in on_faces_selected(ctx.kernel, &faces) {
        println!("{}", summary);
    }
}

/// Print every face with its surface type and label
pub fn handle_list_faces(ctx: &ActionContext) {
    let faces = ctx.app_state.lock().faces.clone();
    if faces.is_empty() {
        println!("No faces loaded");
        return;
    }

    for face in faces {
        let surface = ctx
            .kernel
            .surface_type(face)
            .map(|t| t.to_string())
            .unwrap_or_else(|e| format!("<{}>", e));
        let label = ctx
            .kernel
            .entity_label(face)
            .ok()
            .flatten()
            .unwrap_or_default();
        println!("{:>4}  {:<24} {}", face.index + 1, surface, label);
    }
}
