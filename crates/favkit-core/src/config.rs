use crate::document::{ColorMode, DocumentSpec, Fill, MAX_DIMENSION, ResampleFilter};
use crate::export::{DEFAULT_SMALL_SIZE, ExportOptions};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "favkit";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    Ser(#[from] toml::ser::Error),
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub canvas: CanvasPreferences,
    #[serde(default)]
    pub export: ExportPreferences,
    #[serde(default)]
    pub ui: UiPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            canvas: CanvasPreferences::default(),
            export: ExportPreferences::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Parameters of the canvas created by "Generate Canvas".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasPreferences {
    #[serde(default = "CanvasPreferences::default_name")]
    pub name: String,
    #[serde(default = "CanvasPreferences::default_edge")]
    pub width: u32,
    #[serde(default = "CanvasPreferences::default_edge")]
    pub height: u32,
    #[serde(default = "CanvasPreferences::default_resolution")]
    pub resolution: f64,
    #[serde(default)]
    pub mode: ColorMode,
    #[serde(default)]
    pub fill: Fill,
}

impl Default for CanvasPreferences {
    fn default() -> Self {
        let spec = DocumentSpec::favicon_canvas();
        Self {
            name: spec.name,
            width: spec.width,
            height: spec.height,
            resolution: spec.resolution,
            mode: spec.mode,
            fill: spec.fill,
        }
    }
}

impl CanvasPreferences {
    fn default_name() -> String {
        DocumentSpec::favicon_canvas().name
    }

    fn default_edge() -> u32 {
        DocumentSpec::favicon_canvas().width
    }

    fn default_resolution() -> f64 {
        DocumentSpec::favicon_canvas().resolution
    }

    pub fn to_spec(&self) -> DocumentSpec {
        DocumentSpec {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            resolution: self.resolution,
            mode: self.mode,
            fill: self.fill,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPreferences {
    #[serde(default)]
    pub resample: ResampleFilter,
    #[serde(default = "ExportPreferences::default_small_size")]
    pub small_size: u32,
    /// Folder the last successful export went to; may start with `~`.
    #[serde(default)]
    pub last_folder: Option<String>,
}

impl Default for ExportPreferences {
    fn default() -> Self {
        Self {
            resample: ResampleFilter::default(),
            small_size: DEFAULT_SMALL_SIZE,
            last_folder: None,
        }
    }
}

impl ExportPreferences {
    const fn default_small_size() -> u32 {
        DEFAULT_SMALL_SIZE
    }

    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            small_size: self.small_size,
        }
    }

    pub fn last_folder_path(&self) -> Option<PathBuf> {
        self.last_folder
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(expand_path)
    }
}

/// Persisted UI preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default)]
    pub show_technical_log: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            theme: ThemePreference::Dark,
            show_technical_log: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
    System,
}

/// Expand a leading `~` and environment variables in a user-supplied path.
pub fn expand_path(value: &str) -> PathBuf {
    match shellexpand::full(value) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(value).as_ref()),
    }
}

pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

/// Load configuration from `path`, falling back to defaults with warnings.
pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        CONFIG_FILE_NAME, err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    CONFIG_FILE_NAME, err
                ));
            }
        }
    }

    // Default fallback
    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

/// Repair out-of-range values, reporting each repair as a warning.
pub fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();
    let defaults = CanvasPreferences::default();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown schema_version {}; treating as {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        config.schema_version = CURRENT_SCHEMA_VERSION;
    }

    if config.canvas.width == 0 || config.canvas.width > MAX_DIMENSION {
        warnings.push(format!(
            "canvas.width {} is out of range; reset to {}.",
            config.canvas.width, defaults.width
        ));
        config.canvas.width = defaults.width;
    }
    if config.canvas.height == 0 || config.canvas.height > MAX_DIMENSION {
        warnings.push(format!(
            "canvas.height {} is out of range; reset to {}.",
            config.canvas.height, defaults.height
        ));
        config.canvas.height = defaults.height;
    }
    if !config.canvas.resolution.is_finite() || config.canvas.resolution <= 0.0 {
        warnings.push(format!(
            "canvas.resolution {} is not a positive number; reset to {}.",
            config.canvas.resolution, defaults.resolution
        ));
        config.canvas.resolution = defaults.resolution;
    }
    if config.canvas.name.trim().is_empty() {
        warnings.push("canvas.name is empty; reset to default.".to_string());
        config.canvas.name = defaults.name;
    }

    if config.export.small_size == 0 || config.export.small_size > MAX_DIMENSION {
        warnings.push(format!(
            "export.small_size {} is out of range; reset to {}.",
            config.export.small_size, DEFAULT_SMALL_SIZE
        ));
        config.export.small_size = DEFAULT_SMALL_SIZE;
    }
    if config
        .export
        .last_folder
        .as_deref()
        .is_some_and(|value| value.trim().is_empty())
    {
        config.export.last_folder = None;
    }

    (config, warnings)
}
