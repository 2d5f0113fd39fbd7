//! Console viewer
//!
//! Owns the loaded model, the menu registry and the selection callback.
//! Each input line becomes one event; events are queued as [`AppAction`]s
//! and dispatched one at a time.

mod menu;

use std::io::{self, BufRead, Write};
use std::path::Path;

use thiserror::Error;

use facerec_cad::{CadKernel, CadResult, StepImportOptions};

use crate::actions::{ActionContext, dispatch_action};
use crate::config::AppConfig;
use crate::state::{AppAction, SharedAppState, create_shared_state};

pub use menu::{Menu, MenuBar, MenuItem};

/// Name of the menu holding the batch command
pub const RECOGNITION_MENU: &str = "recognition";

/// Console help text
pub const HELP: &str = "Commands:
  recognition          recognize every face and write the features file
  select <n> [<n>...]  describe the faces with the given numbers (1-based)
  faces                list the faces of the model
  help                 show this help
  quit | exit          leave the viewer";

/// Builds the action for a face pick
pub type SelectCallback = fn(Vec<u32>) -> AppAction;

/// Parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Action(AppAction),
    /// Faces picked by number
    Pick(Vec<u32>),
}

/// Input line errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, type `help` for a list")]
    Unknown(String),

    #[error("`select` needs at least one face number")]
    MissingFaces,

    #[error("invalid face number {0:?}")]
    InvalidFace(String),
}

/// Parse one input line; blank lines yield `None`
pub fn parse_command(line: &str, menus: &MenuBar) -> Result<Option<Input>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let input = match command {
        "select" | "pick" => {
            let numbers = words
                .map(|w| match w.parse::<u32>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(CommandError::InvalidFace(w.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if numbers.is_empty() {
                return Err(CommandError::MissingFaces);
            }
            Input::Pick(numbers)
        }
        "faces" => Input::Action(AppAction::ListFaces),
        "help" | "?" => Input::Action(AppAction::ShowHelp),
        "quit" | "exit" => Input::Action(AppAction::Quit),
        other => menus
            .lookup(other)
            .map(Input::Action)
            .ok_or_else(|| CommandError::Unknown(other.to_string()))?,
    };
    Ok(Some(input))
}

/// Console stand-in for a 3D viewer
pub struct FaceRecViewer {
    app_state: SharedAppState,
    kernel: Box<dyn CadKernel>,
    config: AppConfig,
    menus: MenuBar,
    select_callback: Option<SelectCallback>,
}

impl FaceRecViewer {
    /// Create a viewer with the recognition menu and the selection callback registered
    pub fn new(kernel: Box<dyn CadKernel>, config: AppConfig) -> Self {
        let mut viewer = Self {
            app_state: create_shared_state(),
            kernel,
            config,
            menus: MenuBar::new(),
            select_callback: None,
        };

        viewer.register_select_callback(AppAction::SelectFaces);
        viewer.menus.add_menu(RECOGNITION_MENU);
        viewer.menus.add_function_to_menu(
            RECOGNITION_MENU,
            "recognize_batch",
            AppAction::RunRecognition,
        );
        viewer
    }

    pub fn register_select_callback(&mut self, callback: SelectCallback) {
        self.select_callback = Some(callback);
    }

    pub fn app_state(&self) -> &SharedAppState {
        &self.app_state
    }

    pub fn menus(&self) -> &MenuBar {
        &self.menus
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load a STEP file through the kernel and make it the current model
    pub fn load_model(&self, path: &Path) -> CadResult<()> {
        let options = StepImportOptions {
            length_unit: self.config.input.length_unit,
        };
        let solid = self.kernel.import_step(path, &options)?;
        let faces = self.kernel.faces(&solid)?;
        tracing::info!("Model has {} faces", faces.len());

        self.app_state
            .lock()
            .set_model(path.to_path_buf(), solid, faces);
        Ok(())
    }

    /// Queue an action
    pub fn queue_action(&self, action: AppAction) {
        self.app_state.lock().queue_action(action);
    }

    /// Report picked faces to the selection callback
    pub fn pick(&self, numbers: Vec<u32>) {
        match self.select_callback {
            Some(callback) => self.queue_action(callback(numbers)),
            None => tracing::debug!("No selection callback registered"),
        }
    }

    /// Process pending actions
    pub fn process_actions(&self) {
        let actions = self.app_state.lock().take_pending_actions();
        let ctx = ActionContext::new(&self.app_state, self.kernel.as_ref(), &self.config);

        for action in actions {
            dispatch_action(action, &ctx);
        }
    }

    /// Handle one input line; returns false once the viewer should stop
    pub fn handle_line(&self, line: &str) -> bool {
        match parse_command(line, &self.menus) {
            Ok(Some(Input::Action(action))) => self.queue_action(action),
            Ok(Some(Input::Pick(numbers))) => self.pick(numbers),
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }

        self.process_actions();
        !self.app_state.lock().quit_requested
    }

    /// Read commands until `quit` or end of input
    pub fn run(&self, input: impl BufRead) -> io::Result<()> {
        println!("{}", HELP);
        let mut stdout = io::stdout();
        let mut lines = input.lines();

        loop {
            write!(stdout, "> ")?;
            stdout.flush()?;

            let Some(line) = lines.next() else {
                println!();
                break;
            };
            if !self.handle_line(&line?) {
                break;
            }
        }
        Ok(())
    }
}
