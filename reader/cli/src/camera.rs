//! File-backed camera
//!
//! Stands in for the phone camera: "taking a photo" reads an image file from
//! disk. Permission is always granted.

use std::path::PathBuf;

use async_trait::async_trait;
use reader_core::{Camera, CaptureError, RawImage};

/// Camera that returns the contents of one image file
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    /// Camera for the photo at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn capture(&self) -> Result<RawImage, CaptureError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            CaptureError::Acquisition(format!("cannot read {}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Read photo");
        Ok(RawImage::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"photo").unwrap();

        let camera = FileCamera::new(file.path());
        assert!(camera.request_permission().await);
        assert_eq!(camera.capture().await.unwrap().bytes, b"photo");
    }

    #[tokio::test]
    async fn test_missing_file_is_acquisition_error() {
        let camera = FileCamera::new("/nonexistent/board.jpg");
        assert!(matches!(
            camera.capture().await,
            Err(CaptureError::Acquisition(_))
        ));
    }
}
