//! Frame stepping
//!
//! Decides, once per game tick, whether the physics loop should advance by a
//! single frame. A step is taken when the user asked for one or when the
//! attempt is on frame 0. Further drift-correction triggers are modelled as
//! [`DriftStepConditions`] and stay off unless configured.

use serde::{Deserialize, Serialize};

use super::state::FrameTrackers;

bitflags::bitflags! {
    /// Tracker-driven step triggers
    ///
    /// Each flag, when enabled, forces a step while the matching tracker in
    /// [`FrameTrackers`] is set. None are enabled by default.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DriftStepConditions: u8 {
        /// An ignore-frame marker is set
        const IGNORE_FRAME = 0b0000_0001;
        /// An ignore-jump-button marker is set
        const IGNORE_JUMP_BUTTON = 0b0000_0010;
        /// A main-button release is pending for either player
        const DELAYED_RELEASE_MAIN = 0b0000_0100;
        /// A delayed input is pending for either player
        const DELAYED_INPUT = 0b0000_1000;
        /// A per-axis release is pending for either player
        const DELAYED_RELEASE = 0b0001_0000;
    }
}

impl Default for DriftStepConditions {
    fn default() -> Self {
        Self::empty()
    }
}

impl DriftStepConditions {
    /// Whether any enabled condition is met by the trackers
    pub fn triggered_by(self, trackers: &FrameTrackers) -> bool {
        (self.contains(Self::IGNORE_FRAME) && trackers.ignore_frame.is_some())
            || (self.contains(Self::IGNORE_JUMP_BUTTON) && trackers.ignore_jump_button.is_some())
            || (self.contains(Self::DELAYED_RELEASE_MAIN)
                && trackers.delayed_release_main.iter().any(Option::is_some))
            || (self.contains(Self::DELAYED_INPUT)
                && trackers.delayed_input.iter().any(Option::is_some))
            || (self.contains(Self::DELAYED_RELEASE) && trackers.has_delayed_release())
    }
}

/// Manual single-frame stepping
///
/// Lives in the session, outside of anything the game resets on death.
#[derive(Debug, Clone, Default)]
pub struct FrameStepper {
    /// Frame stepping mode is on (the game only advances on request)
    enabled: bool,
    /// A single step was requested (consumed after one frame)
    step_requested: bool,
}

impl FrameStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn stepping mode on or off
    ///
    /// Leaving stepping mode drops any pending request.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.step_requested = false;
        }
    }

    /// Request a single frame step (only works in stepping mode)
    pub fn request_step(&mut self) {
        if self.enabled {
            self.step_requested = true;
        }
    }

    /// Whether a step is waiting to be taken
    pub fn is_step_requested(&self) -> bool {
        self.step_requested
    }

    /// Take the pending step, if any
    pub fn consume_step(&mut self) -> bool {
        std::mem::take(&mut self.step_requested)
    }
}
