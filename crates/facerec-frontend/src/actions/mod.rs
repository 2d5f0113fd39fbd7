//! Action handling module
//!
//! This module contains the action dispatch system for the viewer.
//! Actions are queued in AppState and processed one at a time.

mod recognition;
mod selection;

use facerec_cad::CadKernel;

use crate::app::HELP;
use crate::config::AppConfig;
use crate::state::{AppAction, SharedAppState};

pub use recognition::handle_recognition;
pub use selection::{handle_list_faces, handle_select_faces};

/// Context for action handlers
pub struct ActionContext<'a> {
    pub app_state: &'a SharedAppState,
    pub kernel: &'a dyn CadKernel,
    pub config: &'a AppConfig,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        app_state: &'a SharedAppState,
        kernel: &'a dyn CadKernel,
        config: &'a AppConfig,
    ) -> Self {
        Self {
            app_state,
            kernel,
            config,
        }
    }
}

/// Dispatch an action to the appropriate handler
pub fn dispatch_action(action: AppAction, ctx: &ActionContext) {
    match action {
        AppAction::RunRecognition => handle_recognition(ctx),
        AppAction::SelectFaces(numbers) => handle_select_faces(&numbers, ctx),
        AppAction::ListFaces => handle_list_faces(ctx),
        AppAction::ShowHelp => println!("{}", HELP),
        AppAction::Quit => {
            tracing::debug!("Quit requested");
            ctx.app_state.lock().quit_requested = true;
        }
    }
}
