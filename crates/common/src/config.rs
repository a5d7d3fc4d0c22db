//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where exported images are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Default processing settings.
    #[serde(default)]
    pub processing: ProcessingDefaults,

    /// Export naming settings.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default processing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingDefaults {
    /// Foreground recolor mode ("white" or "black").
    pub color_mode: String,

    /// Crop detection preset ("standard" or "extended").
    pub crop_sensitivity: String,

    /// Width of the interactive preview container in pixels.
    pub preview_width: u32,

    /// Height of the interactive preview container in pixels.
    pub preview_height: u32,
}

/// Export file naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Prefix placed before the timestamp in generated file names.
    pub file_prefix: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "runstamp=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            processing: ProcessingDefaults::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProcessingDefaults {
    fn default() -> Self {
        Self {
            color_mode: "white".to_string(),
            crop_sensitivity: "standard".to_string(),
            preview_width: 300,
            preview_height: 450,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            file_prefix: crate::naming::DEFAULT_EXPORT_PREFIX.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("runstamp").join("config.json")
}

/// Default export directory.
fn default_output_dir() -> PathBuf {
    let base = std::env::var("XDG_PICTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join("Pictures")
        });
    base.join("runstamp")
}
