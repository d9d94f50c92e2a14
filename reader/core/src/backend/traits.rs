//! Service Traits
//!
//! Trait definitions for the two remote services the reader talks to: board
//! recognition (photo in, board out) and solving (board and goal in, moves
//! out). The reader only sees these traits, so tests and alternative hosts can
//! swap the HTTP clients for anything else.
//!
//! Both services are single-attempt: one request, one response, no retry.
//! Whether to try again is the user's call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardModel, Cell, GoalKey, RobotColor};
use crate::capture::ImageResource;

/// Message used for responses that do not match the wire contract
pub const MALFORMED_RESPONSE: &str = "malformed response";

/// Errors returned by the remote services
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The recognition service rejected the photo or could not be reached
    #[error("recognition failed: {0}")]
    RecognitionFailed(String),

    /// The solver rejected the request or could not be reached
    #[error("solve failed: {0}")]
    SolveFailed(String),

    /// The rendered solution could not be downloaded
    #[error("animation download failed: {0}")]
    AnimationFailed(String),

    /// The HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl BackendError {
    /// Message shown to the user
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::RecognitionFailed(m)
            | Self::SolveFailed(m)
            | Self::AnimationFailed(m)
            | Self::Client(m) => m,
        }
    }
}

/// Remote service connection settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    /// Create a configuration for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the service
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Solutions
// ============================================================================

/// One solver move
///
/// Opaque to the reader beyond counting. The reference solver reports
/// `[robot, to, from]`; [`Move::robot`] reads the first element when present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Move(pub serde_json::Value);

impl Move {
    /// Robot that moved, when the move carries one
    #[must_use]
    pub fn robot(&self) -> Option<RobotColor> {
        let name = self.0.as_array()?.first()?.clone();
        serde_json::from_value(name).ok()
    }
}

/// Result of one solve request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Moves in order
    pub moves: Vec<Move>,
    /// Board at the end of the solved path, when the solver sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardModel>,
    /// Id of the rendered solution animation, when the solver made one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_id: Option<String>,
}

impl Solution {
    /// Number of moves
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

/// Body of a solve request
#[derive(Clone, Debug, Serialize)]
pub struct SolveRequest<'a> {
    /// Board to solve on
    pub board: &'a BoardModel,
    /// Target cell of the chosen goal
    pub goal: Cell,
    /// Robot to move there
    pub robot: RobotColor,
}

impl<'a> SolveRequest<'a> {
    /// Build the request for `goal`, or `None` if the board has no such goal
    #[must_use]
    pub fn new(board: &'a BoardModel, goal: GoalKey) -> Option<Self> {
        Some(Self {
            board,
            goal: board.goal_cell(&goal)?,
            robot: goal.color.mover_color(),
        })
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Service-reported error message, if the body is an error envelope
///
/// An envelope without an `error` string is itself malformed.
pub(crate) fn error_envelope(body: &serde_json::Value) -> Option<String> {
    if body.get("msg").and_then(serde_json::Value::as_str) != Some("error") {
        return None;
    }
    let message = body.get("error").and_then(serde_json::Value::as_str);
    if message.is_none() {
        tracing::debug!("Error envelope has no message");
    }
    Some(message.unwrap_or(MALFORMED_RESPONSE).to_string())
}

fn parse_board(value: &serde_json::Value, grid_size: u32) -> Result<BoardModel, String> {
    let board = BoardModel::deserialize(value).map_err(|e| e.to_string())?;
    board.check_bounds(grid_size).map_err(|e| e.to_string())?;
    Ok(board)
}

/// Interpret a `/read` response body
pub fn parse_recognition_response(
    body: &serde_json::Value,
    grid_size: u32,
) -> Result<BoardModel, BackendError> {
    if let Some(message) = error_envelope(body) {
        return Err(BackendError::RecognitionFailed(message));
    }

    let Some(raw_board) = body.get("board") else {
        tracing::debug!("Recognition response has no board");
        return Err(BackendError::RecognitionFailed(MALFORMED_RESPONSE.to_string()));
    };

    parse_board(raw_board, grid_size).map_err(|reason| {
        tracing::debug!(reason = %reason, "Recognition response board is invalid");
        BackendError::RecognitionFailed(MALFORMED_RESPONSE.to_string())
    })
}

/// Interpret a `/solve` response body
pub fn parse_solve_response(
    body: &serde_json::Value,
    grid_size: u32,
) -> Result<Solution, BackendError> {
    if let Some(message) = error_envelope(body) {
        return Err(BackendError::SolveFailed(message));
    }

    let malformed = |reason: &str| {
        tracing::debug!(reason, "Solve response is malformed");
        BackendError::SolveFailed(MALFORMED_RESPONSE.to_string())
    };

    let moves = body
        .get("moves")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| malformed("missing moves"))?
        .iter()
        .cloned()
        .map(Move)
        .collect();

    let board = match body.get("board") {
        None | Some(serde_json::Value::Null) => None,
        Some(raw) => Some(parse_board(raw, grid_size).map_err(|reason| malformed(&reason))?),
    };

    let solution_id = body
        .get("solution_id")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Ok(Solution {
        moves,
        board,
        solution_id,
    })
}

// ============================================================================
// Service Traits
// ============================================================================

/// Board recognition service
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &str;

    /// Upload a photo and get the recognized board
    ///
    /// The image is consumed and released once the upload is over.
    async fn recognize(&self, image: ImageResource) -> Result<BoardModel, BackendError>;
}

/// Solver service
#[async_trait]
pub trait SolverService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &str;

    /// Ask for a move sequence bringing the goal's robot onto the goal
    async fn solve(&self, board: &BoardModel, goal: GoalKey) -> Result<Solution, BackendError>;

    /// Download the rendered animation of a solution
    async fn fetch_animation(&self, solution_id: &str) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn board() -> BoardModel {
        serde_json::from_value(json!({
            "walls": [[0.5, 1]],
            "robots": {"blue": [1, 1]},
            "goals": {"mc": [4, 2], "bh": [7, 7]}
        }))
        .unwrap()
    }

    #[test]
    fn test_backend_config_default() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url(), "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_recognition_error_envelope() {
        let err = parse_recognition_response(&json!({"msg": "error", "error": "blurry"}), 16)
            .unwrap_err();
        assert_eq!(err, BackendError::RecognitionFailed("blurry".to_string()));
        assert_eq!(err.message(), "blurry");
    }

    #[test]
    fn test_recognition_malformed() {
        for body in [
            json!({}),
            json!({"msg": "success"}),
            json!({"msg": "error"}),
            json!({"msg": "error", "error": 42}),
            json!({"board": {"robots": {}}}),
            json!({"board": {"walls": [], "robots": {"purple": [0, 0]}}}),
            json!({"board": {"walls": [], "robots": {"red": [20, 0]}}}),
            json!([1, 2, 3]),
        ] {
            assert_eq!(
                parse_recognition_response(&body, 16).unwrap_err(),
                BackendError::RecognitionFailed(MALFORMED_RESPONSE.to_string()),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_recognition_success() {
        let body = json!({
            "msg": "success",
            "board": {
                "walls": [[3.5, 2.0], [7.0, 0.5]],
                "robots": {"yellow": [3.0, 3.0]},
                "goals": {"rt": [5.0, 5.0], "gs": [1.0, 9.0]}
            }
        });
        let board = parse_recognition_response(&body, 16).unwrap();
        assert_eq!(board.walls().len(), 2);
        assert_eq!(board.robots().len(), 1);
        assert_eq!(board.goals().len(), 2);
    }

    #[test]
    fn test_solve_request_for_multi_goal() {
        let board = board();
        let goal: GoalKey = "mc".parse().unwrap();
        let request = SolveRequest::new(&board, goal).unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["goal"], json!([4, 2]));
        assert_eq!(value["robot"], json!("red"));
        assert_eq!(value["board"]["robots"], json!({"blue": [1, 1]}));

        let missing: GoalKey = "rt".parse().unwrap();
        assert!(SolveRequest::new(&board, missing).is_none());
    }

    #[test]
    fn test_solve_response_moves_only() {
        let solution =
            parse_solve_response(&json!({"moves": [["red", [0, 3], [0, 0]], 2, "x"]}), 16)
                .unwrap();
        assert_eq!(solution.move_count(), 3);
        assert_eq!(solution.moves[0].robot(), Some(RobotColor::Red));
        assert_eq!(solution.moves[1].robot(), None);
        assert!(solution.board.is_none());
        assert!(solution.solution_id.is_none());
    }

    #[test]
    fn test_solve_response_with_board_and_animation() {
        let solution = parse_solve_response(
            &json!({
                "moves": [],
                "board": {"walls": [], "robots": {"red": [4, 2]}, "goals": {"mc": [4, 2]}},
                "solution_id": "solution"
            }),
            16,
        )
        .unwrap();
        assert_eq!(solution.move_count(), 0);
        assert_eq!(
            solution.board.unwrap().robots().get(&RobotColor::Red),
            Some(&Cell::new(4, 2))
        );
        assert_eq!(solution.solution_id.as_deref(), Some("solution"));
    }

    #[test]
    fn test_solve_response_failures() {
        assert_eq!(
            parse_solve_response(&json!({"msg": "error", "error": "no path"}), 16).unwrap_err(),
            BackendError::SolveFailed("no path".to_string())
        );
        assert_eq!(
            parse_solve_response(&json!({"msg": "error"}), 16).unwrap_err(),
            BackendError::SolveFailed(MALFORMED_RESPONSE.to_string())
        );
        assert_eq!(
            parse_solve_response(&json!({"solution_id": "solution"}), 16).unwrap_err(),
            BackendError::SolveFailed(MALFORMED_RESPONSE.to_string())
        );
        assert_eq!(
            parse_solve_response(&json!({"moves": [], "board": {"walls": 3}}), 16).unwrap_err(),
            BackendError::SolveFailed(MALFORMED_RESPONSE.to_string())
        );
    }
}
