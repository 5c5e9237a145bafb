//! Collaborators supplied by the embedding game
//!
//! The engine never reaches into the game directly. Everything it needs from
//! the outside world (frame counter, level identity, account name, save
//! directory, UI refresh) comes through [`GameHost`], and the record/play
//! panel is reached through [`ControlSurface`].

use std::path::PathBuf;

use crate::session::Session;

/// Identity of the level currently being played
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelIdentity {
    pub id: i32,
    pub name: String,
    /// Low-detail mode toggled for this level
    pub low_detail: bool,
}

/// Services the host game exposes to the engine
///
/// All calls happen on the game-loop thread during a tick.
pub trait GameHost {
    /// Current physics frame of the attempt
    fn current_frame(&self) -> u64;

    /// Level being played, if any
    fn level(&self) -> Option<LevelIdentity>;

    /// Account name, or `None` if the account manager is unavailable
    fn username(&self) -> Option<String>;

    /// Game version tag stored in imported macros
    fn game_version(&self) -> String;

    /// Directory the engine may write macros and autosaves into
    fn save_dir(&self) -> PathBuf;

    /// Whether a mod known to break recording is loaded
    fn has_incompatible_mods(&self) -> bool {
        false
    }

    /// Redraw status labels after a state change
    fn refresh_labels(&mut self) {}

    /// Redraw toggle buttons after a state change
    fn refresh_buttons(&mut self) {}

    /// The record/play panel, if one is currently open
    fn active_surface(&mut self) -> Option<&mut dyn ControlSurface> {
        None
    }

    /// Build a temporary panel for a toggle issued while none is open
    fn create_surface(&mut self) -> Box<dyn ControlSurface> {
        Box::new(HeadlessSurface)
    }
}

/// UI panel owning the record and play toggles
///
/// Implementations update their widgets and then drive the session
/// through its `begin_*`/`end_*` transitions.
pub trait ControlSurface {
    /// Switch recording on or off
    fn set_recording(&mut self, session: &mut Session, enabled: bool);

    /// Switch playback on or off
    fn set_playing(&mut self, session: &mut Session, enabled: bool);

    /// Dismiss the panel
    fn close(&mut self) {}
}

/// Surface without widgets that only performs the session transitions
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessSurface;

impl ControlSurface for HeadlessSurface {
    fn set_recording(&mut self, session: &mut Session, enabled: bool) {
        if enabled {
            session.begin_recording();
        } else {
            session.end_recording();
        }
    }

    fn set_playing(&mut self, session: &mut Session, enabled: bool) {
        if enabled {
            session.begin_playback();
        } else {
            session.end_playback();
        }
    }
}
