//! Import a legacy text macro

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use macrobot_core::replay::read_legacy_file;
use macrobot_core::{Config, Session};

#[derive(Args)]
pub struct ConvertArgs {
    /// Legacy text macro
    pub input: PathBuf,

    /// Output path (extension is added)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write .gdr.json instead of .gdr
    #[arg(long)]
    pub json: bool,

    /// Game version recorded in the macro
    #[arg(long, default_value = "2.2074")]
    pub game_version: String,

    /// Author recorded in the macro
    #[arg(long, default_value = macrobot_core::replay::UNKNOWN_AUTHOR)]
    pub author: String,

    /// Description recorded in the macro
    #[arg(long, default_value = "")]
    pub description: String,
}

/// Convert a legacy macro
pub fn execute(args: ConvertArgs, config: &Config) -> Result<()> {
    let imported = read_legacy_file(&args.input, &args.game_version)
        .with_context(|| format!("Failed to import {}", args.input.display()))?;

    let mut session = Session::new(config.clone());
    *session.active_macro_mut() = imported;

    let base = super::output_base(&args.output);
    let format = super::output_format(args.json, session.config());
    let written = session
        .save(&args.author, &args.description, &base, format)
        .map_err(|e| anyhow::anyhow!("save failed (code {}): {e}", e.code()))?;

    tracing::info!(
        inputs = session.active_macro().inputs.len(),
        fixes = session.active_macro().position_fixes.len(),
        "converted"
    );
    println!("Wrote {}", written.display());
    Ok(())
}
