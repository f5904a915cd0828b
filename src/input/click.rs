//! Click versus drag disambiguation for a single sprite
//!
//! A press followed by a release counts as a click only when fewer than a threshold number of
//! move events happened in between. The tracker is plain state so it can be driven without a
//! renderer's event system.

use crate::input::events::PointerKind;
use serde::{Deserialize, Serialize};

/// Maximum move counts (exclusive) that still count as a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickThresholds {
    pub mouse: u32,
    pub touch: u32,
}

impl ClickThresholds {
    pub fn for_kind(&self, kind: PointerKind) -> u32 {
        match kind {
            PointerKind::Mouse => self.mouse,
            PointerKind::Touch => self.touch,
        }
    }
}

impl Default for ClickThresholds {
    fn default() -> Self {
        crate::core::config::InteractionProfile::Standard.resolve()
    }
}

/// Press/move/release state for one sprite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickTracker {
    pressed: Option<PointerKind>,
    move_count: u32,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Starts a new press-release cycle, discarding any unfinished one
    pub fn press(&mut self, kind: PointerKind) {
        self.pressed = Some(kind);
        self.move_count = 0;
    }

    /// Counts a move of the same pointer kind during a press
    pub fn moved(&mut self, kind: PointerKind) {
        if self.pressed == Some(kind) {
            self.move_count = self.move_count.saturating_add(1);
        }
    }

    /// Ends the cycle; returns true when it counts as a click
    pub fn release(&mut self, kind: PointerKind, thresholds: &ClickThresholds) -> bool {
        if self.pressed != Some(kind) {
            return false;
        }
        let moves = std::mem::take(&mut self.move_count);
        self.pressed = None;
        moves < thresholds.for_kind(kind)
    }
}
