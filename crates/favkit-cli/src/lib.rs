//! Command-line front end for favkit.

pub mod cli_args;

use std::fmt;
use std::path::Path;

use clap::Parser;
use favkit_core::config::FileConfig;
use favkit_core::logging::{LoggingDestination, init_logging};
use favkit_core::{
    Editor, Exporter, FixedFolderPicker, Host, LocalFolder, Notifier, config_path, create_canvas,
    load_config, save_config,
};
use tracing::{info, warn};

pub use cli_args::{CanvasArgs, Cli, Command, ConfigCommand, ExportArgs, FillArg, FilterArg};

const SAVE_CANVAS_COMMAND_NAME: &str = "Save Canvas";

/// Why a CLI run failed.
#[derive(Debug)]
pub enum CliError {
    /// The failure was already shown to the user as an alert.
    Reported,
    Message(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Reported => f.write_str("operation failed"),
            CliError::Message(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CliError {}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

fn message(err: impl fmt::Display) -> CliError {
    CliError::Message(err.to_string())
}

/// Alerts become lines on stderr so stdout stays machine-readable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// True when the process was started with arguments.
pub fn should_run_cli_mode() -> bool {
    std::env::args_os().len() > 1
}

/// Parse `std::env::args` and run the selected command.
pub async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: logging disabled: {err}");
    }
    dispatch(cli).await
}

pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Canvas(args) => run_canvas(args, &load_settings()).await,
        Command::Export(args) => run_export(args, load_settings()).await,
        Command::Config(cmd) => handle_config_command(cmd),
    }
}

fn load_settings() -> FileConfig {
    let load = load_config();
    for warning in load.warnings {
        warn!("{warning}");
        eprintln!("Warning: {warning}");
    }
    load.config
}

pub async fn run_canvas(args: CanvasArgs, config: &FileConfig) -> Result<(), CliError> {
    let spec = args.to_spec(&config.canvas);
    let editor = Editor::new();
    let document = create_canvas(&editor, &ConsoleNotifier, &spec)
        .await
        .map_err(|_| CliError::Reported)?;

    let file_name = args
        .out
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("'{}' does not name a file.", args.out.display()))?;
    let parent = match args.out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let folder = LocalFolder::create(parent).await.map_err(message)?;
    let entry = folder
        .create_file(&file_name, args.force)
        .await
        .map_err(message)?;

    let scope = editor
        .acquire_modal(SAVE_CANVAS_COMMAND_NAME)
        .await
        .map_err(message)?;
    editor
        .save_as_png(&scope, document, &entry)
        .await
        .map_err(message)?;
    drop(scope);

    info!(file = %entry.native_path().display(), "Canvas saved");
    println!(
        "Saved {}x{} canvas to {}",
        spec.width,
        spec.height,
        entry.native_path().display()
    );
    Ok(())
}

pub async fn run_export(args: ExportArgs, mut config: FileConfig) -> Result<(), CliError> {
    let options = args.options(&config.export)?;
    let editor = Editor::with_filter(args.resample(&config.export));
    editor.open_file(&args.input).await.map_err(message)?;

    let destination = args.destination(&config.export);
    let picker = FixedFolderPicker(destination.clone());
    let report = Exporter::new(&editor, &picker, &ConsoleNotifier)
        .with_options(options)
        .run()
        .await
        .map_err(|_| CliError::Reported)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(message)?;
        println!("{json}");
    } else {
        for file in &report.files {
            println!("  {:<14} {}x{}", file.name, file.width, file.height);
        }
    }

    if args.remember {
        if let Some(dir) = destination {
            config.export.last_folder = Some(dir.display().to_string());
            if let Err(err) = save_config(&config) {
                eprintln!("Warning: could not remember destination folder: {err}");
            }
        }
    }
    Ok(())
}

fn handle_config_command(command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Path => {
            println!("{}", config_path().display());
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_settings();
            let rendered = toml::to_string_pretty(&config).map_err(message)?;
            print!("{rendered}");
            Ok(())
        }
        ConfigCommand::Reset => {
            save_config(&FileConfig::default()).map_err(message)?;
            println!("Reset {}", config_path().display());
            Ok(())
        }
    }
}
