//! Reader Messages
//!
//! Messages sent from the reader to the presentation surface. They carry
//! everything a surface needs to draw: the session status, the board, the
//! selected goal and the solution.
//!
//! # Design Philosophy
//!
//! The surface is a pure renderer. It never decides what to show; the
//! [`StatusLine`] derived from the session is the single directive for the
//! status area, and the board view is redrawn from [`ReaderMessage::Board`]
//! and [`ReaderMessage::Selection`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::Solution;
use crate::board::{BoardModel, GoalKey};

/// Messages from the reader to the presentation surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ReaderMessage {
    // ============================================
    // Session
    // ============================================
    /// Session status changed
    Status {
        /// New status
        status: SessionStatus,
        /// What the status area shows for it
        line: StatusLine,
    },

    /// Board to draw; `None` clears the board view
    Board {
        /// Current board
        board: Option<BoardModel>,
    },

    /// Goal selection changed
    Selection {
        /// Selected goal
        goal: Option<GoalKey>,
    },

    /// Solver finished
    Solution {
        /// The solution
        solution: Solution,
    },

    // ============================================
    // System Messages
    // ============================================
    /// Camera access is needed before a photo can be taken
    PermissionRequired,

    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Session lifecycle states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Nothing captured yet
    #[default]
    Idle,
    /// Photo uploaded, waiting for the recognized board
    Analyzing,
    /// Board recognized, waiting for a goal and the solve action
    AwaitingGoal,
    /// Waiting for the solver
    Solving,
    /// Solution received
    Done,
    /// Recognition, capture or solve failed
    Error,
}

impl SessionStatus {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Analyzing => "Analyzing",
            Self::AwaitingGoal => "Awaiting goal",
            Self::Solving => "Solving",
            Self::Done => "Done",
            Self::Error => "Error",
        }
    }

    /// Whether a network request is expected to come back in this state
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Analyzing | Self::Solving)
    }
}

/// What the status area of the surface shows
///
/// Exactly one of these is live for any session state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLine {
    /// Nothing
    #[default]
    Blank,
    /// Recognition in progress
    Analyzing,
    /// Failure text
    Error(String),
    /// Prompt to pick a goal
    SelectGoal,
    /// The solve trigger
    Solve,
    /// Solver in progress
    Solving,
    /// Move count of the solution
    Done {
        /// Number of moves
        moves: usize,
    },
}

impl StatusLine {
    /// Derive the status line from the session
    #[must_use]
    pub fn from_session(
        status: SessionStatus,
        has_selection: bool,
        solution: Option<&Solution>,
        error: Option<&str>,
    ) -> Self {
        match status {
            SessionStatus::Idle => Self::Blank,
            SessionStatus::Analyzing => Self::Analyzing,
            SessionStatus::AwaitingGoal if has_selection => Self::Solve,
            SessionStatus::AwaitingGoal => Self::SelectGoal,
            SessionStatus::Solving => Self::Solving,
            SessionStatus::Done => Self::Done {
                moves: solution.map_or(0, Solution::move_count),
            },
            SessionStatus::Error => Self::Error(error.unwrap_or("Error").to_string()),
        }
    }

    /// Whether this line is the solve trigger
    #[must_use]
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Solve)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Analyzing => f.write_str("Analyzing…"),
            Self::Error(message) => f.write_str(message),
            Self::SelectGoal => f.write_str("Select a goal"),
            Self::Solve => f.write_str("Solve"),
            Self::Solving => f.write_str("Solving…"),
            Self::Done { moves } => write!(f, "Done in {moves} moves"),
        }
    }
}
