//! Solver Client
//!
//! Sends the recognized board and the chosen goal to the solver service.
//!
//! # API
//!
//! - `POST /solve` with `{"board": ..., "goal": [r, c], "robot": "red"}`
//! - Reply: `{"moves": [...], "board"?: {...}, "solution_id"?: "..."}`
//! - `GET /solution/<id>` returns the rendered solution as a GIF

use async_trait::async_trait;

use super::traits::{
    parse_solve_response, BackendConfig, BackendError, Solution, SolveRequest, SolverService,
    MALFORMED_RESPONSE,
};
use crate::board::{BoardModel, GoalKey};

/// HTTP client for the solver service
#[derive(Clone)]
pub struct SolverClient {
    /// Service base URL
    base_url: String,
    /// Grid size reply boards are validated against
    grid_size: u32,
    /// HTTP client
    http_client: reqwest::Client,
}

impl SolverClient {
    /// Create a client for the configured service
    pub fn new(config: &BackendConfig, grid_size: u32) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: config.base_url(),
            grid_size,
            http_client: super::http_client(config.timeout)?,
        })
    }

    /// Get solve endpoint URL
    fn solve_url(&self) -> String {
        format!("{}/solve", self.base_url)
    }

    /// Get solution animation URL, or `None` for ids the service would refuse
    fn animation_url(&self, solution_id: &str) -> Option<String> {
        let valid = !solution_id.is_empty() && solution_id.chars().all(|c| c.is_ascii_alphabetic());
        valid.then(|| format!("{}/solution/{solution_id}", self.base_url))
    }
}

#[async_trait]
impl SolverService for SolverClient {
    fn name(&self) -> &'static str {
        "Solver"
    }

    async fn solve(&self, board: &BoardModel, goal: GoalKey) -> Result<Solution, BackendError> {
        let request = SolveRequest::new(board, goal)
            .ok_or_else(|| BackendError::SolveFailed(format!("goal {goal} is not on the board")))?;

        tracing::debug!(goal = %goal, robot = %request.robot, "Sending solve request");

        let response = self
            .http_client
            .post(self.solve_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::SolveFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::SolveFailed(super::status_failure(status, &body)));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            tracing::debug!(error = %e, "Solve reply is not JSON");
            BackendError::SolveFailed(MALFORMED_RESPONSE.to_string())
        })?;

        parse_solve_response(&body, self.grid_size)
    }

    async fn fetch_animation(&self, solution_id: &str) -> Result<Vec<u8>, BackendError> {
        let url = self.animation_url(solution_id).ok_or_else(|| {
            BackendError::AnimationFailed(format!("invalid solution id {solution_id:?}"))
        })?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::AnimationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::AnimationFailed(format!(
                "service returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::AnimationFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SolverClient {
        SolverClient::new(&BackendConfig::new("localhost", 5000), 16).unwrap()
    }

    #[test]
    fn test_solver_client_urls() {
        let client = client();
        assert_eq!(client.solve_url(), "http://localhost:5000/solve");
        assert_eq!(
            client.animation_url("solution").as_deref(),
            Some("http://localhost:5000/solution/solution")
        );
    }

    #[test]
    fn test_animation_id_must_be_alphabetic() {
        let client = client();
        assert!(client.animation_url("").is_none());
        assert!(client.animation_url("../etc").is_none());
        assert!(client.animation_url("abc123").is_none());
    }

    #[tokio::test]
    async fn test_invalid_animation_id_skips_request() {
        let err = client().fetch_animation("a/b").await.unwrap_err();
        assert!(matches!(err, BackendError::AnimationFailed(_)));
    }

    #[tokio::test]
    async fn test_solve_unknown_goal_fails_before_request() {
        let board: BoardModel =
            serde_json::from_str(r#"{"walls": [], "robots": {"red": [0, 0]}}"#).unwrap();
        let err = client()
            .solve(&board, "rt".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::SolveFailed(_)));
    }
}
