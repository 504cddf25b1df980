//! Main entry point for favkit
//!
//! With arguments the binary runs a CLI command; without any it opens the GUI.

use anyhow::{Context, Result};
use favkit_cli::CliError;

fn main() -> Result<()> {
    if favkit_cli::should_run_cli_mode() {
        let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
        match runtime.block_on(favkit_cli::run()) {
            Ok(()) => {}
            Err(CliError::Reported) => std::process::exit(1),
            Err(e) => return Err(anyhow::anyhow!(e)),
        }
    } else if let Err(e) = favkit_gui::run() {
        eprintln!("GUI error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
