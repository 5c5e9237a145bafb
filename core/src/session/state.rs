//! Session state types
//!
//! Everything here is plain data owned by [`Session`](super::Session).

/// What the engine is doing with the active macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Resting state
    #[default]
    Idle,
    /// Appending live input to the macro
    Recording,
    /// Feeding the macro back into the game
    Playing,
}

/// Whether the active macro's metadata has been filled in
///
/// Metadata is captured once, when the first input of a recording arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataPhase {
    #[default]
    Empty,
    Captured,
}

/// Opaque handle of an in-game checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckpointId(pub u64);

/// What the engine remembers about a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointData {
    /// Frame the checkpoint was placed on
    pub frame: u64,
}

/// Index of a player in the per-player trackers
pub const PLAYER_COUNT: usize = 2;

/// Index of a movement axis in the delayed-release trackers
pub const AXIS_COUNT: usize = 2;

/// Transient per-frame markers used while feeding input to the game
///
/// A `None` marker is unset. All markers are cleared on every state reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTrackers {
    /// Frame whose input should be skipped
    pub ignore_frame: Option<u64>,
    /// Frame whose jump button press should be skipped
    pub ignore_jump_button: Option<u64>,
    /// Pending release of the main button, per player
    pub delayed_release_main: [Option<u64>; PLAYER_COUNT],
    /// Pending delayed input, per player
    pub delayed_input: [Option<u64>; PLAYER_COUNT],
    /// Side buttons still held, per player
    pub side_holding: [bool; PLAYER_COUNT],
    /// Pending release, per player and axis
    pub delayed_release: [[Option<u64>; AXIS_COUNT]; PLAYER_COUNT],
}

impl FrameTrackers {
    /// Clear every marker
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether every marker is unset
    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_delayed_release(&self) -> bool {
        self.delayed_release.iter().flatten().any(Option::is_some)
    }
}
