//! Print macro metadata and statistics

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use macrobot_core::replay::load_macro_file;

#[derive(Args)]
pub struct InspectArgs {
    /// Macro file (.gdr or .gdr.json)
    pub file: PathBuf,
}

/// Inspect a macro file
pub fn execute(args: InspectArgs) -> Result<()> {
    let m = load_macro_file(&args.file)
        .with_context(|| format!("Failed to read macro: {}", args.file.display()))?;

    println!("=== {} ===", args.file.display());
    println!("Author: {}", m.author);
    if !m.description.is_empty() {
        println!("Description: {}", m.description);
    }
    println!("Game version: {}", m.game_version);
    println!("Level: {} ({})", m.level.name, m.level.id);
    println!("Bot: {} {}", m.bot_info.name, m.bot_info.version);
    println!("Frame rate: {}", m.frame_rate);
    println!("Duration: {:.2}s", m.duration);
    println!("Low detail: {}", m.low_detail);

    println!();
    println!("Inputs: {}", m.inputs.len());
    let p2_count = m.inputs.iter().filter(|e| e.player2).count();
    println!("  Player 1: {}", m.inputs.len() - p2_count);
    println!("  Player 2: {}", p2_count);
    if let Some((first, last)) = m.frame_range() {
        println!("  Frames: {first}..={last}");
    }
    if !m.is_sorted_by_frame() {
        println!("  Warning: events are not in frame order");
    }
    println!("Position fixes: {}", m.position_fixes.len());

    Ok(())
}
