use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use favkit_core::config::{CanvasPreferences, ExportPreferences};
use favkit_core::{DocumentSpec, ExportOptions, Fill, MAX_DIMENSION, ResampleFilter};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "favkit", version, about = "Light and dark favicon PNGs from one image", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the blank favicon canvas and save it as a PNG.
    Canvas(CanvasArgs),
    /// Write light/dark favicons at 2x and 1x derived from an image.
    Export(ExportArgs),
    /// Inspect or reset config.toml.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Configuration subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the path of config.toml.
    Path,
    /// Print the effective configuration.
    Show,
    /// Overwrite config.toml with defaults.
    Reset,
}

/// Resampling filter accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos,
}

impl From<FilterArg> for ResampleFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::Nearest => ResampleFilter::Nearest,
            FilterArg::Bilinear => ResampleFilter::Bilinear,
            FilterArg::Bicubic => ResampleFilter::Bicubic,
            FilterArg::Lanczos => ResampleFilter::Lanczos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FillArg {
    White,
    Black,
    Transparent,
}

impl From<FillArg> for Fill {
    fn from(value: FillArg) -> Self {
        match value {
            FillArg::White => Fill::White,
            FillArg::Black => Fill::Black,
            FillArg::Transparent => Fill::Transparent,
        }
    }
}

/// Arguments for `favkit canvas`.
#[derive(Debug, Clone, Args)]
pub struct CanvasArgs {
    /// PNG file to write the canvas to.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub out: PathBuf,

    /// Canvas width in pixels (defaults to config value).
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Canvas height in pixels (defaults to config value).
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Resolution in pixels per inch (defaults to config value).
    #[arg(long, value_name = "DPI")]
    pub resolution: Option<f64>,

    #[arg(long, value_enum)]
    pub fill: Option<FillArg>,

    /// Replace the output file if it exists.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub force: bool,
}

impl CanvasArgs {
    /// Canvas parameters: config values with command-line overrides applied.
    pub fn to_spec(&self, prefs: &CanvasPreferences) -> DocumentSpec {
        let mut spec = prefs.to_spec();
        if let Some(width) = self.width {
            spec.width = width;
        }
        if let Some(height) = self.height {
            spec.height = height;
        }
        if let Some(resolution) = self.resolution {
            spec.resolution = resolution;
        }
        if let Some(fill) = self.fill {
            spec.fill = fill.into();
        }
        spec
    }
}

/// Arguments for `favkit export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Image to open as the active document.
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Destination folder (defaults to the last remembered folder).
    #[arg(short = 'o', long = "out-dir", value_hint = ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// Resampling filter for the 1x outputs (defaults to config value).
    #[arg(long, value_enum)]
    pub filter: Option<FilterArg>,

    /// Edge length of the 1x outputs (defaults to config value).
    #[arg(long = "small-size", value_name = "PX")]
    pub small_size: Option<u32>,

    /// Print the export report as JSON on stdout.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Store the destination folder in config.toml after a successful export.
    #[arg(long, action = ArgAction::SetTrue)]
    pub remember: bool,
}

impl ExportArgs {
    pub fn resample(&self, prefs: &ExportPreferences) -> ResampleFilter {
        self.filter.map(Into::into).unwrap_or(prefs.resample)
    }

    pub fn options(&self, prefs: &ExportPreferences) -> Result<ExportOptions, String> {
        let mut options = prefs.options();
        if let Some(size) = self.small_size {
            if size == 0 || size > MAX_DIMENSION {
                return Err(format!(
                    "--small-size must be between 1 and {MAX_DIMENSION} pixels (got {size})."
                ));
            }
            options.small_size = size;
        }
        Ok(options)
    }

    /// Destination folder; `None` acts like a cancelled folder picker.
    pub fn destination(&self, prefs: &ExportPreferences) -> Option<PathBuf> {
        self.out_dir
            .as_ref()
            .map(|dir| favkit_core::config::expand_path(&dir.to_string_lossy()))
            .or_else(|| prefs.last_folder_path())
    }
}
