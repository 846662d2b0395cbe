// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::flash::FlashMode;
use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Video4Linux2 capture devices (`/dev/video*`)
    #[default]
    V4l2,
    /// Generated test pattern, no hardware required
    Synthetic,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Which way the camera points
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// User-facing (selfie) camera
    Front,
    /// World-facing camera
    #[default]
    Back,
}

impl Facing {
    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// Settings of the live preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewConfig {
    pub facing: Facing,
    pub flash: FlashMode,
}

/// Still-capture quality in the range 0.0 (smallest file) to 1.0 (best)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CaptureQuality(f32);

impl CaptureQuality {
    /// Highest quality, used for every capture the session makes
    pub const MAX: CaptureQuality = CaptureQuality(1.0);

    /// Create a quality value, clamping into `0.0..=1.0` (NaN becomes max)
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::MAX;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Raw value in `0.0..=1.0`
    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality for the JPEG encoder (1-100)
    pub fn jpeg_quality(self) -> u8 {
        use crate::constants::jpeg::{MAX_QUALITY, MIN_QUALITY};
        let span = (MAX_QUALITY - MIN_QUALITY) as f32;
        MIN_QUALITY + (self.0 * span).round() as u8
    }
}

impl Default for CaptureQuality {
    fn default() -> Self {
        Self::MAX
    }
}

/// A single RGB24 frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB pixels (`width * 3` bytes per row)
    pub data: Arc<[u8]>,
    /// Timestamp when the frame was produced
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap packed RGB data; returns `None` when the buffer size does not match
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != (width * height * 3) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        })
    }

    /// Build a frame from an `image` buffer
    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw()),
            captured_at: Instant::now(),
        }
    }

    /// RGB value at (x, y), clamped to the frame bounds
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = ((y * self.width + x) * 3) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }

    /// Copy into an `image` buffer for encoding
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}

struct CapturedImage {
    id: Uuid,
    taken_at: DateTime<Local>,
    facing: Facing,
    quality: CaptureQuality,
    jpeg: Vec<u8>,
    preview: CameraFrame,
}

/// Opaque handle to a captured still image held in memory
///
/// Cloning is cheap; clones refer to the same artifact and compare equal.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<CapturedImage>,
}

impl ImageHandle {
    /// Encode a frame into a still-image artifact
    ///
    /// CPU-bound; backends run this inside `spawn_blocking`.
    pub fn encode(
        frame: CameraFrame,
        facing: Facing,
        quality: CaptureQuality,
    ) -> BackendResult<Self> {
        let image = frame
            .to_rgb_image()
            .ok_or_else(|| BackendError::CaptureFailed("Frame buffer size mismatch".into()))?;
        let jpeg = crate::media::encoding::encode_jpeg(&image, quality)
            .map_err(|e| BackendError::CaptureFailed(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(CapturedImage {
                id: Uuid::new_v4(),
                taken_at: Local::now(),
                facing,
                quality,
                jpeg,
                preview: frame,
            }),
        })
    }

    /// Unique identifier of this capture
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Wall-clock time of the capture
    pub fn taken_at(&self) -> DateTime<Local> {
        self.inner.taken_at
    }

    /// Camera that took the picture
    pub fn facing(&self) -> Facing {
        self.inner.facing
    }

    /// Quality the artifact was encoded with
    pub fn quality(&self) -> CaptureQuality {
        self.inner.quality
    }

    /// Encoded JPEG bytes
    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.inner.jpeg
    }

    /// Decoded pixels for on-screen review
    pub fn preview(&self) -> &CameraFrame {
        &self.inner.preview
    }

    pub fn width(&self) -> u32 {
        self.inner.preview.width
    }

    pub fn height(&self) -> u32 {
        self.inner.preview.height
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ImageHandle {}

impl std::fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.inner.id)
            .field("facing", &self.inner.facing)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("jpeg_bytes", &self.inner.jpeg.len())
            .finish()
    }
}

/// A camera found on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Device index (`/dev/videoN`)
    pub index: usize,
    /// Human-readable name reported by the driver
    pub name: String,
    /// Device node path
    pub path: String,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Backend or hardware is not available on this system
    #[error("Camera not available: {0}")]
    NotAvailable(String),
    /// No device configured/found for the requested camera
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Device is in use or did not deliver a frame in time
    #[error("Camera is busy: {0}")]
    Busy(String),
    /// Frame could not be turned into a still image
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> CameraFrame {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, 128])
        });
        CameraFrame::from_image(image)
    }

    #[test]
    fn test_facing_toggle_is_involution() {
        assert_eq!(Facing::default(), Facing::Back);
        assert_eq!(Facing::Back.toggled(), Facing::Front);
        assert_eq!(Facing::Front.toggled().toggled(), Facing::Front);
    }

    #[test]
    fn test_capture_quality_clamps() {
        assert_eq!(CaptureQuality::new(2.0), CaptureQuality::MAX);
        assert_eq!(CaptureQuality::new(-1.0).value(), 0.0);
        assert_eq!(CaptureQuality::new(f32::NAN), CaptureQuality::MAX);
        assert_eq!(CaptureQuality::MAX.jpeg_quality(), 100);
        assert_eq!(CaptureQuality::new(0.0).jpeg_quality(), 1);
    }

    #[test]
    fn test_frame_from_rgb_rejects_bad_length() {
        assert!(CameraFrame::from_rgb(2, 2, vec![0; 12]).is_some());
        assert!(CameraFrame::from_rgb(2, 2, vec![0; 11]).is_none());
        assert!(CameraFrame::from_rgb(0, 2, Vec::new()).is_none());
    }

    #[test]
    fn test_pixel_is_clamped_to_bounds() {
        let frame = gradient(8, 8);
        assert_eq!(frame.pixel(100, 100), frame.pixel(7, 7));
        assert_eq!(frame.pixel(1, 0), (4, 0, 128));
    }

    #[test]
    fn test_image_handle_encodes_jpeg() {
        let handle = ImageHandle::encode(gradient(32, 16), Facing::Front, CaptureQuality::MAX)
            .expect("encode");
        assert_eq!(handle.width(), 32);
        assert_eq!(handle.height(), 16);
        assert_eq!(handle.facing(), Facing::Front);
        // JPEG SOI marker
        assert_eq!(&handle.jpeg_bytes()[..2], &[0xFF, 0xD8]);

        let copy = handle.clone();
        assert_eq!(copy, handle);
        let other = ImageHandle::encode(gradient(32, 16), Facing::Front, CaptureQuality::MAX)
            .expect("encode");
        assert_ne!(other, handle);
    }
}
