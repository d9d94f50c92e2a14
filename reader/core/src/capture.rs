//! Photo Capture
//!
//! Wraps the platform camera behind the [`Camera`] capability trait and turns
//! one raw photo into a normalized [`ImageResource`]: the central 80% of the
//! frame (10% inset on both axes), re-encoded as PNG.
//!
//! # Design Philosophy
//!
//! Camera permission dialogs and previews belong to the host platform. The
//! core only needs two things from it: ask for permission, and take a photo.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use image::ImageFormat;
use thiserror::Error;

/// Errors raised while acquiring a photo
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Camera access was not granted
    #[error("camera permission denied")]
    PermissionDenied,

    /// The platform failed to take the photo
    #[error("photo acquisition failed: {0}")]
    Acquisition(String),

    /// The photo could not be decoded, cropped or encoded
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

/// A photo as delivered by the platform camera (any format `image` can decode)
#[derive(Clone, Debug)]
pub struct RawImage {
    /// Encoded photo bytes
    pub bytes: Vec<u8>,
}

impl RawImage {
    /// Wrap encoded photo bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Camera capability supplied by the host platform
#[async_trait]
pub trait Camera: Send + Sync {
    /// Ask the user for camera access; returns whether it was granted
    async fn request_permission(&self) -> bool;

    /// Take one photo
    async fn capture(&self) -> Result<RawImage, CaptureError>;
}

/// Crop rectangle in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl CropRegion {
    /// Central 80% of a `width` x `height` frame, starting at the 10% inset
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn centered(width: u32, height: u32) -> Self {
        let inset = |v: u32| (u64::from(v) / 10) as u32;
        let extent = |v: u32| (u64::from(v) * 8 / 10) as u32;
        Self {
            x: inset(width),
            y: inset(height),
            width: extent(width),
            height: extent(height),
        }
    }
}

/// A cropped, PNG-encoded photo ready for upload
///
/// Owned by the session that captured it and released when dropped, which
/// happens once the upload finishes or fails.
#[derive(Debug)]
pub struct ImageResource {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageResource {
    /// PNG bytes
    #[must_use]
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Decode, crop and re-encode a raw photo
    pub fn normalize(raw: &RawImage) -> Result<Self, CaptureError> {
        let photo = image::load_from_memory(&raw.bytes)?;
        let region = CropRegion::centered(photo.width(), photo.height());
        if region.width == 0 || region.height == 0 {
            return Err(CaptureError::Acquisition(format!(
                "photo too small to crop: {}x{}",
                photo.width(),
                photo.height()
            )));
        }

        let cropped = photo.crop_imm(region.x, region.y, region.width, region.height);
        let mut png = Cursor::new(Vec::new());
        cropped.write_to(&mut png, ImageFormat::Png)?;

        Ok(Self {
            png: png.into_inner(),
            width: cropped.width(),
            height: cropped.height(),
        })
    }
}

impl Drop for ImageResource {
    fn drop(&mut self) {
        tracing::trace!(bytes = self.png.len(), "Released captured image");
    }
}

/// One camera plus the permission state the platform reported for it
pub struct CaptureSession<C: Camera> {
    camera: C,
    granted: AtomicBool,
}

impl<C: Camera> CaptureSession<C> {
    /// Wrap a camera; permission starts out not granted
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            granted: AtomicBool::new(false),
        }
    }

    /// Whether camera access has been granted
    pub fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Ask the platform for camera access and remember the answer
    pub async fn request_permission(&self) -> bool {
        let granted = self.camera.request_permission().await;
        self.granted.store(granted, Ordering::SeqCst);
        tracing::info!(granted, "Camera permission requested");
        granted
    }

    /// Take a photo and normalize it
    ///
    /// Fails with [`CaptureError::PermissionDenied`] until permission has been
    /// granted through [`request_permission`](Self::request_permission).
    pub async fn capture(&self) -> Result<ImageResource, CaptureError> {
        if !self.permission_granted() {
            return Err(CaptureError::PermissionDenied);
        }

        let raw = self.camera.capture().await?;
        let image = tokio::task::spawn_blocking(move || ImageResource::normalize(&raw))
            .await
            .map_err(|e| CaptureError::Acquisition(format!("crop task failed: {e}")))??;

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            bytes = image.png_bytes().len(),
            "Captured board photo"
        );
        Ok(image)
    }
}
