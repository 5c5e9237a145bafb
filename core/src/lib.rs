//! Macrobot Core - frame-accurate macro engine
//!
//! Records per-frame player input for a platformer, stores it in a versioned
//! binary format (with a JSON variant and a legacy text importer), and plays
//! it back against a game loop the engine does not own.
//!
//! # Architecture
//!
//! - [`Session`] - Context owned by the host; record/play state machine
//! - [`GameHost`] / [`ControlSurface`] - What the embedding game provides
//! - [`replay`] - Macro data model, codecs and the playback cursor
//! - [`persistence`] - Saving, collision-free naming, autosave
//! - [`config`] - User settings (`config.toml`)

pub mod config;
pub mod host;
pub mod persistence;
pub mod replay;
pub mod session;
#[cfg(test)]
pub mod test_utils;

// Re-export the types most hosts touch
pub use config::Config;
pub use host::{ControlSurface, GameHost, HeadlessSurface, LevelIdentity};
pub use persistence::{SAVE_OK, SaveError};
pub use replay::{
    CodecError, InputEvent, LegacyError, Macro, MacroFormat, PlayerPosition, PositionFix,
};
pub use session::{
    CheckpointData, CheckpointId, DriftStepConditions, FrameStepper, FrameTrackers,
    MetadataPhase, Session, SessionState,
};
