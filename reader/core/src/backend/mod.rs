//! Remote Service Integration
//!
//! Access to the board recognition and solver services through a common pair
//! of traits.
//!
//! # Available Clients
//!
//! - **RecognitionClient**: `POST /read`, multipart photo upload
//! - **SolverClient**: `POST /solve` and `GET /solution/<id>`
//!
//! # Usage
//!
//! ```ignore
//! use reader_core::backend::{BackendConfig, RecognitionClient, RecognitionService};
//!
//! let client = RecognitionClient::new(&BackendConfig::default(), 16)?;
//! let board = client.recognize(image).await?;
//! ```

mod recognition;
mod solver;
mod traits;

use std::time::Duration;

pub use recognition::RecognitionClient;
pub use solver::SolverClient;
pub use traits::{
    parse_recognition_response, parse_solve_response, BackendConfig, BackendError, Move,
    RecognitionService, Solution, SolveRequest, SolverService, MALFORMED_RESPONSE,
};

/// Build the shared HTTP client used by both services
fn http_client(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::Client(e.to_string()))
}

/// Message for a non-success reply, preferring the service's own error text
fn status_failure(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| traits::error_envelope(&value))
        .unwrap_or_else(|| format!("service returned {status}: {body}"))
}
