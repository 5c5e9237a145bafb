//! Re-encode a macro file

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use macrobot_core::{Config, Session};

#[derive(Args)]
pub struct ExportArgs {
    /// Input macro (.gdr or .gdr.json)
    pub input: PathBuf,

    /// Output path (extension is added)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write .gdr.json instead of .gdr
    #[arg(long)]
    pub json: bool,
}

/// Export a macro in the requested format
pub fn execute(args: ExportArgs, config: &Config) -> Result<()> {
    let mut session = Session::new(config.clone());
    session
        .load_file(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    // Keep the stored author and description
    let author = session.active_macro().author.clone();
    let description = session.active_macro().description.clone();

    let base = super::output_base(&args.output);
    let format = super::output_format(args.json, session.config());
    let written = session
        .save(&author, &description, &base, format)
        .map_err(|e| anyhow::anyhow!("save failed (code {}): {e}", e.code()))?;

    println!("Wrote {}", written.display());
    Ok(())
}
