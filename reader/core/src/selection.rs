//! Goal Selection
//!
//! Tracks the goal the user picked on the current board. The selection is
//! only ever set to a goal the board actually has; the reader resets it
//! whenever a new board replaces the old one.

use crate::board::{BoardModel, GoalKey};
use crate::coords::CoordinateMapper;

/// Opacity of the selected goal, or of every goal when nothing is selected
pub const FULL_OPACITY: f64 = 1.0;

/// Opacity of goals that are not selected
pub const DIMMED_OPACITY: f64 = 0.2;

/// The currently chosen goal marker, if any
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GoalSelection {
    selected: Option<GoalKey>,
}

impl GoalSelection {
    /// Create an empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `key` if the board has it; otherwise leave the selection alone
    ///
    /// Returns whether the key was accepted.
    pub fn select(&mut self, board: &BoardModel, key: GoalKey) -> bool {
        if board.has_goal(&key) {
            self.selected = Some(key);
            true
        } else {
            false
        }
    }

    /// Drop the selection
    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Hit-test a tap: select the goal under the point, or clear when there is none
    pub fn tap(&mut self, board: &BoardModel, mapper: &CoordinateMapper, x: f64, y: f64) {
        match mapper.point_to_cell(x, y).and_then(|cell| board.goal_at(cell)) {
            Some(key) => self.selected = Some(key),
            None => self.clear(),
        }
    }

    /// Selected goal
    #[must_use]
    pub fn selected(&self) -> Option<GoalKey> {
        self.selected
    }

    /// Whether any goal is selected
    #[must_use]
    pub fn is_some(&self) -> bool {
        self.selected.is_some()
    }

    /// Whether `key` is the selected goal
    #[must_use]
    pub fn is_selected(&self, key: &GoalKey) -> bool {
        self.selected.as_ref() == Some(key)
    }

    /// Opacity `key` is drawn with
    #[must_use]
    pub fn opacity(&self, key: &GoalKey) -> f64 {
        match self.selected {
            None => FULL_OPACITY,
            Some(ref selected) if selected == key => FULL_OPACITY,
            Some(_) => DIMMED_OPACITY,
        }
    }
}
