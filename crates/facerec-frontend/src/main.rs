//! facerec main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use facerec_frontend::config::LoggingConfig;
use facerec_frontend::{AppAction, ConfigManager, FaceRecViewer};

/// Classify the faces of a STEP model into planes and cylinders
#[derive(Parser)]
#[command(name = "facerec")]
#[command(about = "STEP face feature recognition", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (RON); defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// STEP file to load
    #[arg(long)]
    step: Option<PathBuf>,

    /// Where to write the recognized features
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run recognition once and exit instead of starting the viewer
    #[arg(long)]
    batch: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<ExitCode> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, reload, util::SubscriberInitExt};

    let cli = Cli::parse();

    // Logging comes up before the config file is read so that load problems
    // are reported; the configured filter replaces the bootstrap one after.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let filter_from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| EnvFilter::new(LoggingConfig::DEFAULT_FILTER)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    if !filter_from_env {
        let configured = &manager.config().logging.filter;
        if let Err(e) = filter_handle.reload(EnvFilter::new(configured)) {
            tracing::warn!("Failed to apply log filter {:?}: {}", configured, e);
        }
    }

    tracing::info!("Starting facerec");

    let mut config = manager.config().clone();
    if let Some(step) = cli.step {
        config.input.step_path = step;
    }
    if let Some(output) = cli.output {
        config.recognition.output_path = output;
    }

    if cli.save_config {
        *manager.config_mut() = config;
        manager.save()?;
        println!("Saved {}", manager.config_file_path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let step_path = config.input.step_path.clone();

    let viewer = FaceRecViewer::new(facerec_cad::default_kernel(), config);
    if let Err(e) = viewer.load_model(&step_path) {
        tracing::error!("Failed to load {}: {}", step_path.display(), e);
        println!("Error: can't read file.");
        return Ok(ExitCode::FAILURE);
    }

    if cli.batch {
        viewer.queue_action(AppAction::RunRecognition);
        viewer.process_actions();
        let written = viewer.app_state().lock().last_features.is_some();
        return Ok(if written {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    viewer.run(std::io::stdin().lock())?;
    Ok(ExitCode::SUCCESS)
}
