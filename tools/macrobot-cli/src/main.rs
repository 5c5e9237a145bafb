//! Macrobot CLI - Convert and inspect recorded macros
//!
//! # Commands
//!
//! - `macrobot convert` - Import a legacy text macro into `.gdr` / `.gdr.json`
//! - `macrobot inspect` - Print a macro's metadata and event statistics
//! - `macrobot export` - Re-encode a macro in the other format
//!
//! # Usage
//!
//! ```bash
//! # Import an old text macro
//! macrobot convert old.txt -o levels/stereo
//!
//! # Human-readable copy of a binary macro
//! macrobot export levels/stereo.gdr -o levels/stereo --json
//!
//! # Verbose logging
//! RUST_LOG=debug macrobot inspect levels/stereo.gdr
//! ```

mod convert;
mod export;
mod inspect;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use macrobot_core::Config;
use macrobot_core::replay::{BINARY_EXTENSION, JSON_EXTENSION, MacroFormat};

/// Macrobot CLI - Convert and inspect recorded macros
#[derive(Parser)]
#[command(name = "macrobot")]
#[command(about = "Convert and inspect recorded macros")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a legacy pipe-delimited text macro
    Convert(convert::ConvertArgs),

    /// Print metadata and statistics of a .gdr or .gdr.json file
    Inspect(inspect::InspectArgs),

    /// Re-encode a .gdr or .gdr.json file
    Export(export::ExportArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = macrobot_core::config::load();

    match cli.command {
        Commands::Convert(args) => convert::execute(args, &config),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Export(args) => export::execute(args, &config),
    }
}

/// Format selected by the `--json` flag, else the configured default
fn output_format(json: bool, config: &Config) -> MacroFormat {
    if json {
        MacroFormat::Json
    } else {
        config.recording.default_format
    }
}

/// Strip a macro extension from an output path
///
/// Saving appends the extension itself, so `-o run.gdr` and `-o run` name
/// the same file.
fn output_base(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    for ext in [JSON_EXTENSION, BINARY_EXTENSION] {
        if let Some(stem) = text.strip_suffix(ext) {
            return PathBuf::from(stem);
        }
    }
    path.to_path_buf()
}
