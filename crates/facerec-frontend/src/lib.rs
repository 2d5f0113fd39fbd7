//! Face Recognition Frontend
//!
//! Console viewer and batch runner for STEP face recognition.

pub mod actions;
pub mod app;
pub mod config;
pub mod state;

// Re-exports for convenience
pub use app::{FaceRecViewer, MenuBar};
pub use config::{AppConfig, ConfigManager};
pub use state::{AppAction, AppState, SharedAppState};
