//! Application configuration module
//!
//! This module handles input, recognition output and logging settings.

mod manager;

pub use manager::{ConfigError, ConfigManager};

use std::path::PathBuf;

use facerec_cad::LengthUnit;
use facerec_core::{BatchOptions, DocumentOptions, FaultPolicy};
use serde::{Deserialize, Serialize};

/// Input settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// STEP file loaded at startup
    pub step_path: PathBuf,
    /// Length unit override for STEP import
    pub length_unit: LengthUnit,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            step_path: PathBuf::from("./object3.STEP"),
            length_unit: LengthUnit::FromFile,
        }
    }
}

/// Recognition settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Where the batch run writes its features
    pub output_path: PathBuf,
    /// Handling of faces the kernel fails on
    pub fault_policy: FaultPolicy,
    /// Persist cylinder radii in the output
    pub include_cylinder_radius: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./features.json"),
            fault_policy: FaultPolicy::SkipAndLog,
            include_cylinder_radius: false,
        }
    }
}

impl RecognitionConfig {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            fault_policy: self.fault_policy,
        }
    }

    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            include_cylinder_radius: self.include_cylinder_radius,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl LoggingConfig {
    /// Filter covering the binary and every library crate
    pub const DEFAULT_FILTER: &'static str =
        "facerec=info,facerec_frontend=info,facerec_core=info,facerec_cad=info";
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: Self::DEFAULT_FILTER.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.version, AppConfig::CURRENT_VERSION);
        assert_eq!(config.input.step_path, PathBuf::from("./object3.STEP"));
        assert_eq!(
            config.recognition.output_path,
            PathBuf::from("./features.json")
        );
        assert!(!config.recognition.document_options().include_cylinder_radius);
        assert_eq!(
            config.recognition.batch_options().fault_policy,
            FaultPolicy::SkipAndLog
        );
    }

    #[test]
    fn test_default_filter_enables_binary_target() {
        use tracing_subscriber::layer::SubscriberExt;

        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::EnvFilter::new(&LoggingConfig::default().filter),
        );
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "facerec", tracing::Level::INFO));
            assert!(tracing::enabled!(target: "facerec_cad::kernel", tracing::Level::WARN));
            assert!(!tracing::enabled!(target: "facerec", tracing::Level::DEBUG));
        });
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = ron::from_str(
            "(version: 1, recognition: (include_cylinder_radius: true, fault_policy: Abort))",
        )
        .unwrap();

        assert!(config.recognition.include_cylinder_radius);
        assert_eq!(config.recognition.fault_policy, FaultPolicy::Abort);
        assert_eq!(
            config.recognition.output_path,
            PathBuf::from("./features.json")
        );
        assert_eq!(config.input, InputConfig::default());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = AppConfig::new();
        config.input.length_unit = LengthUnit::Inch;
        config.logging.filter = "debug".into();

        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: AppConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
