//! Surface Events
//!
//! Events sent from the presentation surface to the reader. The surface only
//! reports what the user did; the reader decides what it means in the current
//! session state.

use serde::{Deserialize, Serialize};

use crate::board::GoalKey;

/// Events from the presentation surface to the reader
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReaderEvent {
    /// User agreed to the camera permission prompt
    PermissionRequested,

    /// User pressed the shutter
    CaptureRequested,

    /// User picked a goal by key
    GoalSelected {
        /// Goal key
        key: GoalKey,
    },

    /// User tapped the board view, in board coordinates
    BoardTapped {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },

    /// User cleared the goal selection
    SelectionCleared,

    /// User pressed the solve trigger
    SolveRequested,

    /// User wants to quit
    QuitRequested,
}

impl ReaderEvent {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PermissionRequested => "permission_requested",
            Self::CaptureRequested => "capture_requested",
            Self::GoalSelected { .. } => "goal_selected",
            Self::BoardTapped { .. } => "board_tapped",
            Self::SelectionCleared => "selection_cleared",
            Self::SolveRequested => "solve_requested",
            Self::QuitRequested => "quit_requested",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_event_round_trip() {
        let event = ReaderEvent::GoalSelected {
            key: "mc".parse().unwrap(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"GoalSelected":{"key":"mc"}}"#);
        assert_eq!(serde_json::from_str::<ReaderEvent>(&json).unwrap(), event);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ReaderEvent::SolveRequested.name(), "solve_requested");
        assert_eq!(
            ReaderEvent::BoardTapped { x: 1.0, y: 2.0 }.name(),
            "board_tapped"
        );
    }
}
