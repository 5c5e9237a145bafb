//! Frame-driven playback cursor
//!
//! Walks a macro's event log in order of occurrence, handing the game loop
//! the events due at each physics frame.

use smallvec::SmallVec;

use crate::replay::types::{InputEvent, Macro, PositionFix};

/// Events emitted for one frame (usually zero to two)
pub type FrameEvents = SmallVec<[InputEvent; 4]>;

/// Read position into a macro's inputs and position fixes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    input_index: usize,
    fix_index: usize,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending event whose frame is at or before `frame`
    ///
    /// Events are emitted in log order. An out-of-order event in a loaded
    /// macro is emitted as soon as the cursor reaches it.
    pub fn poll(&mut self, m: &Macro, frame: u64) -> FrameEvents {
        let mut due = FrameEvents::new();
        while let Some(event) = m.inputs.get(self.input_index) {
            if event.frame > frame {
                break;
            }
            due.push(*event);
            self.input_index += 1;
        }
        due
    }

    /// Position fix recorded for exactly `frame`, if any
    ///
    /// Fixes for frames already passed are skipped.
    pub fn fix_for(&mut self, m: &Macro, frame: u64) -> Option<PositionFix> {
        while let Some(fix) = m.position_fixes.get(self.fix_index) {
            if fix.frame > frame {
                return None;
            }
            self.fix_index += 1;
            if fix.frame == frame {
                return Some(*fix);
            }
        }
        None
    }

    /// Reposition at the first event and fix at or after `frame`
    pub fn rewind(&mut self, m: &Macro, frame: u64) {
        self.input_index = m
            .inputs
            .iter()
            .position(|e| e.frame >= frame)
            .unwrap_or(m.inputs.len());
        self.fix_index = m
            .position_fixes
            .iter()
            .position(|f| f.frame >= frame)
            .unwrap_or(m.position_fixes.len());
    }

    /// Back to the start of the macro
    pub fn reset(&mut self) {
        self.input_index = 0;
        self.fix_index = 0;
    }

    /// Whether every input has been emitted
    pub fn is_complete(&self, m: &Macro) -> bool {
        self.input_index >= m.inputs.len()
    }

    /// Playback progress (0.0 to 1.0) by event count
    pub fn progress(&self, m: &Macro) -> f32 {
        if m.inputs.is_empty() {
            return 0.0;
        }
        self.input_index as f32 / m.inputs.len() as f32
    }
}
