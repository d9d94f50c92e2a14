//! Recognition Client
//!
//! Uploads a cropped board photo to the recognition service and turns the
//! JSON reply into a [`BoardModel`].
//!
//! # API
//!
//! - `POST /read`, multipart form, field `file` = PNG bytes
//! - Reply: `{"msg": "error", "error": "..."}` or `{"board": {...}}`

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::traits::{
    parse_recognition_response, BackendConfig, BackendError, RecognitionService,
    MALFORMED_RESPONSE,
};
use crate::board::BoardModel;
use crate::capture::ImageResource;

/// HTTP client for the recognition service
#[derive(Clone)]
pub struct RecognitionClient {
    /// Service base URL
    base_url: String,
    /// Grid size replies are validated against
    grid_size: u32,
    /// HTTP client
    http_client: reqwest::Client,
}

impl RecognitionClient {
    /// Create a client for the configured service
    pub fn new(config: &BackendConfig, grid_size: u32) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: config.base_url(),
            grid_size,
            http_client: super::http_client(config.timeout)?,
        })
    }

    /// Get read endpoint URL
    fn read_url(&self) -> String {
        format!("{}/read", self.base_url)
    }
}

#[async_trait]
impl RecognitionService for RecognitionClient {
    fn name(&self) -> &'static str {
        "Recognition"
    }

    async fn recognize(&self, image: ImageResource) -> Result<BoardModel, BackendError> {
        let fail = |e: reqwest::Error| BackendError::RecognitionFailed(e.to_string());

        let part = Part::bytes(image.png_bytes().to_vec())
            .file_name("board.png")
            .mime_str("image/png")
            .map_err(fail)?;
        let form = Form::new().part("file", part);

        let sent = self
            .http_client
            .post(self.read_url())
            .multipart(form)
            .send()
            .await;
        drop(image);
        let response = sent.map_err(fail)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RecognitionFailed(super::status_failure(status, &body)));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            tracing::debug!(error = %e, "Recognition reply is not JSON");
            BackendError::RecognitionFailed(MALFORMED_RESPONSE.to_string())
        })?;

        parse_recognition_response(&body, self.grid_size)
    }
}
