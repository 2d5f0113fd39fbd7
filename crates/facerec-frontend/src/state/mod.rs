//! Application state module

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use facerec_cad::{FaceId, Solid};
use facerec_core::FeatureDocument;

/// Actions that can be performed on the app state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Run the batch recognition over every face and write the features
    RunRecognition,
    /// Faces picked in the viewer (1-based face numbers)
    SelectFaces(Vec<u32>),
    /// Print the faces of the loaded solid
    ListFaces,
    /// Print the available commands
    ShowHelp,
    /// Leave the viewer
    Quit,
}

/// Application state
#[derive(Default)]
pub struct AppState {
    /// Path of the loaded STEP file
    pub step_path: Option<PathBuf>,
    /// Loaded solid
    pub solid: Option<Solid>,
    /// Faces of the loaded solid, in kernel order
    pub faces: Vec<FaceId>,
    /// Features written by the last recognition run
    pub last_features: Option<FeatureDocument>,
    /// Set once the viewer should stop reading input
    pub quit_requested: bool,
    /// Pending actions
    pending_actions: Vec<AppAction>,
}

impl AppState {
    /// Create a new app state
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a loaded solid and its faces
    pub fn set_model(&mut self, path: PathBuf, solid: Solid, faces: Vec<FaceId>) {
        self.step_path = Some(path);
        self.solid = Some(solid);
        self.faces = faces;
        self.last_features = None;
    }

    /// Face handle for a 1-based face number
    pub fn face(&self, number: u32) -> Option<FaceId> {
        let index = number.checked_sub(1)?;
        self.faces.get(index as usize).copied()
    }

    /// Queue an action
    pub fn queue_action(&mut self, action: AppAction) {
        self.pending_actions.push(action);
    }

    /// Take pending actions
    pub fn take_pending_actions(&mut self) -> Vec<AppAction> {
        std::mem::take(&mut self.pending_actions)
    }
}

/// Shared app state type
pub type SharedAppState = Arc<Mutex<AppState>>;

/// Create a new shared app state
pub fn create_shared_state() -> SharedAppState {
    Arc::new(Mutex::new(AppState::new()))
}
