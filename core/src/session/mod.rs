//! Recording/playback session
//!
//! [`Session`] is the single context the host game loop owns and passes to
//! every engine call. It holds the active macro, the record/play state, the
//! checkpoint map used to gate autosaves, and the per-frame trackers.
//!
//! # State machine
//!
//! ```text
//!          begin_recording            begin_playback
//!   Idle ------------------> Recording     Idle ------------> Playing
//!    ^  <------------------            ^  <----------------
//!    |      end_recording              |     end_playback
//!    +------- reset_state -------------+
//! ```
//!
//! Recording and playback are mutually exclusive; starting one stops the
//! other.

mod state;
mod step;

pub use state::{
    AXIS_COUNT, CheckpointData, CheckpointId, FrameTrackers, MetadataPhase, PLAYER_COUNT,
    SessionState,
};
pub use step::{DriftStepConditions, FrameStepper};

use hashbrown::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::host::GameHost;
use crate::replay::{
    BotInfo, CodecError, FrameEvents, InputEvent, Macro, PlaybackCursor, PositionFix,
    UNKNOWN_AUTHOR, import_legacy_file, load_macro_file,
};

/// Engine state owned by the host game loop
#[derive(Debug)]
pub struct Session {
    config: Config,
    state: SessionState,
    active: Macro,
    metadata: MetadataPhase,
    /// The attempt is about to restart (set by the host on death/reset)
    restart: bool,
    stepper: FrameStepper,
    trackers: FrameTrackers,
    /// Frame of the last successful autosave
    last_autosave: u64,
    checkpoints: HashMap<CheckpointId, CheckpointData>,
    session_id: String,
    cursor: PlaybackCursor,
}

impl Session {
    /// Create an idle session with an empty macro
    pub fn new(config: Config) -> Self {
        let session_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let active = Macro {
            frame_rate: config.recording.frame_rate,
            ..Macro::default()
        };

        Self {
            config,
            state: SessionState::Idle,
            active,
            metadata: MetadataPhase::Empty,
            restart: false,
            stepper: FrameStepper::new(),
            trackers: FrameTrackers::default(),
            last_autosave: 0,
            checkpoints: HashMap::new(),
            session_id,
            cursor: PlaybackCursor::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn active_macro(&self) -> &Macro {
        &self.active
    }

    pub fn active_macro_mut(&mut self) -> &mut Macro {
        &mut self.active
    }

    pub fn metadata_phase(&self) -> MetadataPhase {
        self.metadata
    }

    /// Identifier used in autosave file names
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_session_id(&mut self, id: impl Into<String>) {
        self.session_id = id.into();
    }

    pub fn restart_pending(&self) -> bool {
        self.restart
    }

    pub fn set_restart(&mut self, restart: bool) {
        self.restart = restart;
    }

    pub fn trackers(&self) -> &FrameTrackers {
        &self.trackers
    }

    pub fn trackers_mut(&mut self) -> &mut FrameTrackers {
        &mut self.trackers
    }

    pub fn stepper(&self) -> &FrameStepper {
        &self.stepper
    }

    pub fn stepper_mut(&mut self) -> &mut FrameStepper {
        &mut self.stepper
    }

    /// Frame below which autosave triggers are ignored
    pub fn last_autosave(&self) -> u64 {
        self.last_autosave
    }

    pub(crate) fn set_last_autosave(&mut self, frame: u64) {
        self.last_autosave = frame;
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    /// Append one input event to the active macro
    ///
    /// The first event of a recording captures the macro metadata from the
    /// host. Frame order is not validated; the game loop calls this in
    /// increasing frame order.
    pub fn record_action(
        &mut self,
        host: &dyn GameHost,
        frame: u64,
        button: u8,
        player2: bool,
        hold: bool,
    ) {
        if self.metadata == MetadataPhase::Empty {
            self.capture_metadata(host);
        }
        self.active
            .push_input(InputEvent::new(frame, button, player2, hold));
    }

    /// Fill in level, author, detail mode, frame rate and bot info
    fn capture_metadata(&mut self, host: &dyn GameHost) {
        let Some(level) = host.level() else {
            debug!("no active level, metadata capture deferred");
            return;
        };

        let m = &mut self.active;
        m.frame_rate = self.config.recording.frame_rate;
        m.low_detail = level.low_detail;
        m.level.id = level.id;
        m.level.name = level.name;
        m.author = host
            .username()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        m.bot_info = BotInfo::default();

        self.metadata = MetadataPhase::Captured;
        debug!(level = m.level.id, author = %m.author, "captured macro metadata");
    }

    /// Enter recording with a fresh macro
    pub fn begin_recording(&mut self) {
        if self.state == SessionState::Playing {
            self.end_playback();
        }

        self.active = Macro {
            frame_rate: self.config.recording.frame_rate,
            ..Macro::default()
        };
        self.metadata = MetadataPhase::Empty;
        self.last_autosave = 0;
        self.cursor.reset();
        self.state = SessionState::Recording;
        info!("recording started");
    }

    /// Leave recording, keeping the recorded macro
    pub fn end_recording(&mut self) {
        if self.state == SessionState::Recording {
            self.state = SessionState::Idle;
            info!(inputs = self.active.inputs.len(), "recording stopped");
        }
    }

    /// Enter playback from the start of the active macro
    ///
    /// Returns `false` and stays put if there is nothing to play.
    pub fn begin_playback(&mut self) -> bool {
        if self.active.is_empty() {
            warn!("cannot play an empty macro");
            return false;
        }

        if self.state == SessionState::Recording {
            self.end_recording();
        }

        self.cursor.reset();
        self.state = SessionState::Playing;
        info!(inputs = self.active.inputs.len(), "playback started");
        true
    }

    /// Leave playback
    pub fn end_playback(&mut self) {
        if self.state == SessionState::Playing {
            self.state = SessionState::Idle;
            info!("playback stopped");
        }
    }

    // ------------------------------------------------------------------
    // Toggles and reset
    // ------------------------------------------------------------------

    /// Flip recording through the host's control surface
    ///
    /// With a panel open, the panel is told the target state. Otherwise a
    /// temporary panel is built, applied and closed. Does nothing while an
    /// incompatible mod is loaded.
    pub fn toggle_recording(&mut self, host: &mut dyn GameHost) {
        if host.has_incompatible_mods() {
            return;
        }

        let target = self.state != SessionState::Recording;

        if let Some(surface) = host.active_surface() {
            surface.set_recording(self, target);
            return;
        }

        let mut surface = host.create_surface();
        surface.set_recording(self, target);
        surface.close();
    }

    /// Flip playback through the host's control surface
    pub fn toggle_playing(&mut self, host: &mut dyn GameHost) {
        if host.has_incompatible_mods() {
            return;
        }

        let target = self.state != SessionState::Playing;

        if let Some(surface) = host.active_surface() {
            surface.set_playing(self, target);
            return;
        }

        let mut surface = host.create_surface();
        surface.set_playing(self, target);
        surface.close();
    }

    /// Return to idle
    ///
    /// Clears the restart flag and every per-frame tracker. Checkpoints are
    /// dropped unless `preserve_checkpoints` is set.
    pub fn reset_state(&mut self, host: &mut dyn GameHost, preserve_checkpoints: bool) {
        self.restart = false;
        self.state = SessionState::Idle;

        if !preserve_checkpoints {
            self.checkpoints.clear();
        }

        host.refresh_labels();
        host.refresh_buttons();

        self.trackers.reset();
    }

    /// Whether the game loop should advance a single frame this tick
    pub fn should_step(&self, host: &dyn GameHost) -> bool {
        if self.stepper.is_step_requested() {
            return true;
        }
        if host.current_frame() == 0 {
            return true;
        }

        self.config
            .playback
            .drift_step_conditions
            .triggered_by(&self.trackers)
    }

    // ------------------------------------------------------------------
    // Checkpoints
    // ------------------------------------------------------------------

    /// Remember a checkpoint placed at `frame`
    pub fn register_checkpoint(&mut self, id: CheckpointId, frame: u64) {
        self.checkpoints.insert(id, CheckpointData { frame });
    }

    /// Forget a checkpoint (e.g. when the game removes it)
    pub fn remove_checkpoint(&mut self, id: CheckpointId) -> Option<CheckpointData> {
        self.checkpoints.remove(&id)
    }

    pub fn checkpoint(&self, id: CheckpointId) -> Option<CheckpointData> {
        self.checkpoints.get(&id).copied()
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Events due at or before `frame`; empty unless playing
    pub fn poll_playback(&mut self, frame: u64) -> FrameEvents {
        if self.state != SessionState::Playing {
            return FrameEvents::new();
        }
        self.cursor.poll(&self.active, frame)
    }

    /// Position fix recorded for exactly `frame`; `None` unless playing
    pub fn position_fix_for(&mut self, frame: u64) -> Option<PositionFix> {
        if self.state != SessionState::Playing {
            return None;
        }
        self.cursor.fix_for(&self.active, frame)
    }

    /// Reposition playback after the attempt restarts at `frame`
    pub fn rewind_playback(&mut self, frame: u64) {
        self.cursor.rewind(&self.active, frame);
    }

    /// Whether playback has emitted every event
    pub fn playback_complete(&self) -> bool {
        self.cursor.is_complete(&self.active)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the active macro with an imported legacy file
    ///
    /// On failure the active macro is reset and `false` is returned.
    pub fn load_legacy(&mut self, path: &Path, game_version: &str) -> bool {
        let imported = import_legacy_file(path, game_version);
        if imported.is_load_failure() {
            self.discard_macro();
            return false;
        }

        info!(path = %path.display(), inputs = imported.inputs.len(), "imported legacy macro");
        self.replace_macro(imported);
        true
    }

    /// Replace the active macro with a `.gdr` or `.gdr.json` file
    ///
    /// On failure the active macro is reset.
    pub fn load_file(&mut self, path: &Path) -> Result<(), CodecError> {
        match load_macro_file(path) {
            Ok(loaded) => {
                info!(path = %path.display(), inputs = loaded.inputs.len(), "loaded macro");
                self.replace_macro(loaded);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), "failed to load macro: {e}");
                self.discard_macro();
                Err(e)
            }
        }
    }

    fn replace_macro(&mut self, m: Macro) {
        self.active = m;
        self.metadata = MetadataPhase::Captured;
        self.cursor.reset();
    }

    fn discard_macro(&mut self) {
        self.active = Macro {
            frame_rate: self.config.recording.frame_rate,
            ..Macro::default()
        };
        self.metadata = MetadataPhase::Empty;
        self.cursor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LevelIdentity;
    use crate::replay::{BinaryWriter, PlayerPosition};
    use crate::test_utils::{MockHost, MockSurface, sample_macro};

    fn recording_session() -> Session {
        let mut session = Session::new(Config::default());
        session.begin_recording();
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new(Config::default());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.active_macro().is_empty());
        assert_eq!(session.metadata_phase(), MetadataPhase::Empty);
        assert!(!session.session_id().is_empty());
    }

    #[test]
    fn test_record_action_captures_metadata_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        let mut session = recording_session();

        session.record_action(&host, 5, 1, false, true);
        assert_eq!(session.metadata_phase(), MetadataPhase::Captured);

        let m = session.active_macro();
        assert_eq!(m.author, "player");
        assert_eq!(m.level.id, 42);
        assert_eq!(m.level.name, "Test Level");
        assert!(!m.low_detail);
        assert_eq!(m.frame_rate, 240.0);

        // A later change on the host is not picked up mid-recording
        host.level = Some(LevelIdentity {
            id: 7,
            name: "Other".to_string(),
            low_detail: true,
        });
        session.record_action(&host, 9, 1, false, false);
        assert_eq!(session.active_macro().level.id, 42);
        assert_eq!(
            session.active_macro().inputs,
            vec![
                InputEvent::new(5, 1, false, true),
                InputEvent::new(9, 1, false, false)
            ]
        );
    }

    #[test]
    fn test_metadata_author_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        host.username = Some(String::new());

        let mut session = recording_session();
        session.record_action(&host, 1, 1, false, true);
        assert_eq!(session.active_macro().author, UNKNOWN_AUTHOR);

        host.username = None;
        session.begin_recording();
        session.record_action(&host, 1, 1, false, true);
        assert_eq!(session.active_macro().author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_metadata_deferred_without_level() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        host.level = None;

        let mut session = recording_session();
        session.record_action(&host, 1, 1, false, true);
        assert_eq!(session.metadata_phase(), MetadataPhase::Empty);
        assert_eq!(session.active_macro().inputs.len(), 1);

        host.level = Some(LevelIdentity::default());
        session.record_action(&host, 2, 1, false, false);
        assert_eq!(session.metadata_phase(), MetadataPhase::Captured);
    }

    #[test]
    fn test_record_does_not_validate_order() {
        let dir = tempfile::tempdir().unwrap();
        let host = MockHost::new(dir.path());
        let mut session = recording_session();

        session.record_action(&host, 50, 1, false, true);
        session.record_action(&host, 10, 1, false, false);
        assert!(!session.active_macro().is_sorted_by_frame());
    }

    #[test]
    fn test_begin_recording_resets_macro() {
        let mut session = Session::new(Config::default());
        *session.active_macro_mut() = sample_macro();
        session.set_last_autosave(100);

        session.begin_recording();
        assert!(session.active_macro().is_empty());
        assert_eq!(session.metadata_phase(), MetadataPhase::Empty);
        assert_eq!(session.last_autosave(), 0);
    }

    #[test]
    fn test_recording_and_playing_exclusive() {
        let mut session = recording_session();
        *session.active_macro_mut() = sample_macro();

        assert!(session.begin_playback());
        assert_eq!(session.state(), SessionState::Playing);
        assert!(!session.is_recording());

        session.begin_recording();
        assert_eq!(session.state(), SessionState::Recording);
        assert!(!session.is_playing());
    }

    #[test]
    fn test_begin_playback_requires_inputs() {
        let mut session = Session::new(Config::default());
        assert!(!session.begin_playback());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_toggle_recording_without_surface() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        let mut session = Session::new(Config::default());

        session.toggle_recording(&mut host);
        assert_eq!(session.state(), SessionState::Recording);
        assert_eq!(host.surfaces_created, 1);

        session.toggle_recording(&mut host);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(host.surfaces_created, 2);
    }

    #[test]
    fn test_toggle_delegates_to_active_surface() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path()).with_surface();
        let mut session = Session::new(Config::default());

        session.toggle_recording(&mut host);
        session.toggle_recording(&mut host);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(host.surfaces_created, 0);

        let surface: &MockSurface = host.surface.as_ref().unwrap();
        assert_eq!(surface.recording_calls, vec![true, false]);
        assert!(!surface.closed);
    }

    #[test]
    fn test_toggle_playing() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path()).with_surface();
        let mut session = Session::new(Config::default());
        *session.active_macro_mut() = sample_macro();

        session.toggle_playing(&mut host);
        assert_eq!(session.state(), SessionState::Playing);
        session.toggle_playing(&mut host);
        assert_eq!(session.state(), SessionState::Idle);

        let surface = host.surface.as_ref().unwrap();
        assert_eq!(surface.playing_calls, vec![true, false]);
    }

    #[test]
    fn test_toggle_blocked_by_incompatible_mods() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        host.incompatible_mods = true;
        let mut session = Session::new(Config::default());
        *session.active_macro_mut() = sample_macro();

        session.toggle_recording(&mut host);
        session.toggle_playing(&mut host);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(host.surfaces_created, 0);
    }

    #[test]
    fn test_reset_state_preserves_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        let mut session = recording_session();
        session.register_checkpoint(CheckpointId(1), 120);
        session.set_restart(true);
        session.trackers_mut().ignore_frame = Some(3);
        session.trackers_mut().delayed_release[1][0] = Some(8);

        session.reset_state(&mut host, true);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.restart_pending());
        assert_eq!(session.checkpoint_count(), 1);
        assert!(session.trackers().is_clear());
        assert_eq!(host.label_refreshes, 1);
        assert_eq!(host.button_refreshes, 1);
    }

    #[test]
    fn test_reset_state_clears_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        let mut session = recording_session();
        session.register_checkpoint(CheckpointId(1), 120);
        session.register_checkpoint(CheckpointId(2), 480);
        session.trackers_mut().side_holding = [true, true];

        session.reset_state(&mut host, false);
        assert_eq!(session.checkpoint_count(), 0);
        assert!(session.trackers().is_clear());
    }

    #[test]
    fn test_should_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        let mut session = Session::new(Config::default());

        // Frame 0 always steps, whatever the manual flag says
        host.frame = 0;
        assert!(session.should_step(&host));

        host.frame = 10;
        assert!(!session.should_step(&host));

        session.stepper_mut().set_enabled(true);
        session.stepper_mut().request_step();
        assert!(session.should_step(&host));
        assert!(session.stepper_mut().consume_step());
        assert!(!session.should_step(&host));
    }

    #[test]
    fn test_should_step_drift_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MockHost::new(dir.path());
        host.frame = 10;
        let mut session = Session::new(Config::default());
        session.trackers_mut().delayed_input[0] = Some(11);

        assert!(!session.should_step(&host));

        session.config_mut().playback.drift_step_conditions = DriftStepConditions::DELAYED_INPUT;
        assert!(session.should_step(&host));
    }

    #[test]
    fn test_checkpoints() {
        let mut session = Session::new(Config::default());
        session.register_checkpoint(CheckpointId(9), 300);
        assert_eq!(session.checkpoint(CheckpointId(9)), Some(CheckpointData { frame: 300 }));

        assert!(session.remove_checkpoint(CheckpointId(9)).is_some());
        assert_eq!(session.checkpoint(CheckpointId(9)), None);
    }

    #[test]
    fn test_playback_polling() {
        let mut session = Session::new(Config::default());
        let mut m = sample_macro();
        m.push_fix(PositionFix {
            frame: 60,
            player1: PlayerPosition::at(10.0, 20.0),
            player2: PlayerPosition::default(),
        });
        *session.active_macro_mut() = m;

        // Nothing is emitted while idle
        assert!(session.poll_playback(1000).is_empty());

        assert!(session.begin_playback());
        assert_eq!(session.poll_playback(30).len(), 1);
        assert_eq!(session.position_fix_for(60).map(|f| f.frame), Some(60));
        assert_eq!(session.poll_playback(1000).len(), 2);
        assert!(session.playback_complete());

        session.rewind_playback(0);
        assert!(!session.playback_complete());
    }

    #[test]
    fn test_load_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.txt");
        std::fs::write(&path, "60\n30|0|1|0|0\n").unwrap();

        let host = MockHost::new(dir.path());
        let mut session = Session::new(Config::default());
        assert!(session.load_legacy(&path, &host.game_version()));
        assert_eq!(session.active_macro().inputs, vec![InputEvent::new(120, 1, false, false)]);
        assert_eq!(session.active_macro().game_version, "2.2074");
        assert_eq!(session.metadata_phase(), MetadataPhase::Captured);
    }

    #[test]
    fn test_failed_legacy_load_resets_macro() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "60\n30|0|1|0\n").unwrap();

        let mut session = Session::new(Config::default());
        *session.active_macro_mut() = sample_macro();

        assert!(!session.load_legacy(&path, "2.2"));
        assert!(session.active_macro().is_empty());
        assert!(!session.active_macro().is_load_failure());
        assert!(!session.load_legacy(&dir.path().join("missing.txt"), "2.2"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gdr");
        let m = sample_macro();
        let mut writer = BinaryWriter::new(std::fs::File::create(&path).unwrap());
        writer.write_macro(&m).unwrap();
        drop(writer);

        let mut session = Session::new(Config::default());
        session.load_file(&path).unwrap();
        assert_eq!(session.active_macro(), &m);

        std::fs::write(&path, b"GDRM\x09").unwrap();
        assert!(session.load_file(&path).is_err());
        assert!(session.active_macro().is_empty());
    }
}
