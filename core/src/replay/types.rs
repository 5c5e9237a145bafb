//! Core types for the macro system
//!
//! This module defines the data structures shared by the binary (.gdr),
//! JSON (.gdr.json) and legacy text formats.

use serde::{Deserialize, Serialize};

/// Default recording frame rate (physics ticks per second)
pub const DEFAULT_FRAME_RATE: f64 = 240.0;

/// Author recorded when no account name is available
pub const UNKNOWN_AUTHOR: &str = "N/A";

/// Description carried by a macro whose load failed
///
/// Never produced by recording; callers check [`Macro::is_load_failure`]
/// before accepting an imported macro.
pub const LOAD_FAILURE_SENTINEL: &str = "fail";

/// Name of the bot that records macros
pub const BOT_NAME: &str = "macrobot";

/// Version of the bot that records macros
pub const BOT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A single button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Physics frame the transition happened on
    pub frame: u64,
    /// Button code (1 = jump, 2 = left, 3 = right)
    pub button: u8,
    /// Whether the event belongs to the second player
    pub player2: bool,
    /// true = press, false = release
    pub hold: bool,
}

impl InputEvent {
    pub fn new(frame: u64, button: u8, player2: bool, hold: bool) -> Self {
        Self {
            frame,
            button,
            player2,
            hold,
        }
    }
}

/// Player transform captured for a position fix
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub flipped: bool,
}

impl PlayerPosition {
    /// Position without rotation or flip (legacy data and v1 fixes)
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            rotation: 0.0,
            flipped: false,
        }
    }
}

/// Correction applied at a frame to combat floating-point drift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub frame: u64,
    pub player1: PlayerPosition,
    pub player2: PlayerPosition,
}

/// Bot that produced the macro
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub name: String,
    pub version: String,
}

impl Default for BotInfo {
    fn default() -> Self {
        Self {
            name: BOT_NAME.to_string(),
            version: BOT_VERSION.to_string(),
        }
    }
}

/// Level the macro was recorded on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelInfo {
    pub id: i32,
    pub name: String,
}

/// Complete macro (in-memory representation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macro {
    pub author: String,
    pub description: String,
    pub game_version: String,
    /// Physics frames per second the frame numbers refer to
    pub frame_rate: f64,
    /// Seconds; recomputed from the last event when saving
    pub duration: f64,
    pub inputs: Vec<InputEvent>,
    pub position_fixes: Vec<PositionFix>,
    pub bot_info: BotInfo,
    /// Low-detail mode was active while recording
    pub low_detail: bool,
    pub level: LevelInfo,
}

impl Default for Macro {
    fn default() -> Self {
        Self {
            author: String::new(),
            description: String::new(),
            game_version: String::new(),
            frame_rate: DEFAULT_FRAME_RATE,
            duration: 0.0,
            inputs: Vec::new(),
            position_fixes: Vec::new(),
            bot_info: BotInfo::default(),
            low_detail: false,
            level: LevelInfo::default(),
        }
    }
}

impl Macro {
    /// Create an empty macro
    pub fn new() -> Self {
        Self::default()
    }

    /// Macro returned by a failed import
    pub fn load_failure() -> Self {
        Self {
            author: UNKNOWN_AUTHOR.to_string(),
            description: LOAD_FAILURE_SENTINEL.to_string(),
            ..Self::default()
        }
    }

    /// Whether this macro is the failure value of an import
    pub fn is_load_failure(&self) -> bool {
        self.description == LOAD_FAILURE_SENTINEL
    }

    /// Append an input event
    pub fn push_input(&mut self, event: InputEvent) {
        self.inputs.push(event);
    }

    /// Append a position fix
    pub fn push_fix(&mut self, fix: PositionFix) {
        self.position_fixes.push(fix);
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Frame of the last recorded event (by position, not by value)
    pub fn last_frame(&self) -> Option<u64> {
        self.inputs.last().map(|e| e.frame)
    }

    /// Smallest and largest frame of all events
    pub fn frame_range(&self) -> Option<(u64, u64)> {
        let min = self.inputs.iter().map(|e| e.frame).min()?;
        let max = self.inputs.iter().map(|e| e.frame).max()?;
        Some((min, max))
    }

    /// Whether the event log is in non-decreasing frame order
    pub fn is_sorted_by_frame(&self) -> bool {
        self.inputs.windows(2).all(|w| w[0].frame <= w[1].frame)
    }

    /// Recompute `duration` from the last event
    pub fn update_duration(&mut self) {
        self.duration = match self.last_frame() {
            Some(frame) if self.frame_rate > 0.0 => frame as f64 / self.frame_rate,
            _ => 0.0,
        };
    }
}
