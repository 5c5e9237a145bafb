//! Shared test utilities for unit tests

use std::path::{Path, PathBuf};

use crate::host::{ControlSurface, GameHost, HeadlessSurface, LevelIdentity};
use crate::replay::{InputEvent, Macro};
use crate::session::Session;

// ============================================================================
// Test Host Implementation
// ============================================================================

/// Scriptable game host
///
/// Every query answers from a public field so tests can change the game
/// between calls. Refresh calls and surface creation are counted.
pub struct MockHost {
    pub frame: u64,
    pub level: Option<LevelIdentity>,
    pub username: Option<String>,
    pub game_version: String,
    pub save_dir: PathBuf,
    pub incompatible_mods: bool,
    pub label_refreshes: u32,
    pub button_refreshes: u32,
    /// Panel reported as open, if any
    pub surface: Option<MockSurface>,
    pub surfaces_created: u32,
}

impl MockHost {
    /// Host on level 42 "Test Level", logged in as "player"
    pub fn new(save_dir: &Path) -> Self {
        Self {
            frame: 0,
            level: Some(LevelIdentity {
                id: 42,
                name: "Test Level".to_string(),
                low_detail: false,
            }),
            username: Some("player".to_string()),
            game_version: "2.2074".to_string(),
            save_dir: save_dir.to_path_buf(),
            incompatible_mods: false,
            label_refreshes: 0,
            button_refreshes: 0,
            surface: None,
            surfaces_created: 0,
        }
    }

    /// Same host with a control panel open
    pub fn with_surface(mut self) -> Self {
        self.surface = Some(MockSurface::default());
        self
    }
}

impl GameHost for MockHost {
    fn current_frame(&self) -> u64 {
        self.frame
    }

    fn level(&self) -> Option<LevelIdentity> {
        self.level.clone()
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }

    fn game_version(&self) -> String {
        self.game_version.clone()
    }

    fn save_dir(&self) -> PathBuf {
        self.save_dir.clone()
    }

    fn has_incompatible_mods(&self) -> bool {
        self.incompatible_mods
    }

    fn refresh_labels(&mut self) {
        self.label_refreshes += 1;
    }

    fn refresh_buttons(&mut self) {
        self.button_refreshes += 1;
    }

    fn active_surface(&mut self) -> Option<&mut dyn ControlSurface> {
        self.surface
            .as_mut()
            .map(|surface| surface as &mut dyn ControlSurface)
    }

    fn create_surface(&mut self) -> Box<dyn ControlSurface> {
        self.surfaces_created += 1;
        Box::new(MockSurface::default())
    }
}

/// Control panel that records the toggles it receives
#[derive(Debug, Default)]
pub struct MockSurface {
    pub recording_calls: Vec<bool>,
    pub playing_calls: Vec<bool>,
    pub closed: bool,
}

impl ControlSurface for MockSurface {
    fn set_recording(&mut self, session: &mut Session, enabled: bool) {
        self.recording_calls.push(enabled);
        HeadlessSurface.set_recording(session, enabled);
    }

    fn set_playing(&mut self, session: &mut Session, enabled: bool) {
        self.playing_calls.push(enabled);
        HeadlessSurface.set_playing(session, enabled);
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

// ============================================================================
// Macro Builders
// ============================================================================

/// Three jump events on player 1: press at 30, release at 90, press at 150
pub fn sample_macro() -> Macro {
    let mut m = Macro::new();
    m.author = "tester".to_string();
    m.game_version = "2.2074".to_string();
    m.level.id = 42;
    m.level.name = "Test Level".to_string();
    m.push_input(InputEvent::new(30, 1, false, true));
    m.push_input(InputEvent::new(90, 1, false, false));
    m.push_input(InputEvent::new(150, 1, false, true));
    m
}
