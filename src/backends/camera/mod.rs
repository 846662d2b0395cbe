// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌──────────────────────────┐
//! │ CaptureSessionController │
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │   CameraDevice trait     │  ← preview surface + still capture
//! └────────────┬─────────────┘
//!              │
//!       ┌──────┴───────┐
//!       ▼              ▼
//!   ┌───────┐    ┌───────────┐
//!   │ V4L2  │    │ Synthetic │
//!   └───────┘    └───────────┘
//! ```

pub mod convert;
pub mod synthetic;
pub mod types;
pub mod v4l2;

pub use synthetic::SyntheticCamera;
pub use types::*;
pub use v4l2::V4l2Camera;

use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;

/// A camera that streams a live preview and takes single still images
///
/// Implementations own their streaming resources; the session only pushes
/// preview settings and asks for stills.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Apply facing/flash settings to the live preview
    ///
    /// Switching facing may reopen the underlying device. Failure leaves the
    /// previous stream running (or none).
    fn configure(&self, config: PreviewConfig) -> BackendResult<()>;

    /// Most recent preview frame, if the stream has produced one
    fn latest_frame(&self) -> Option<CameraFrame>;

    /// Capture a single still image at the given quality
    ///
    /// # Returns
    /// * `Ok(ImageHandle)` - In-memory still image
    /// * `Err(BackendError)` - Hardware unavailable, busy or failed
    async fn capture_still(&self, quality: CaptureQuality) -> BackendResult<ImageHandle>;

    /// Stop streaming and release the device
    fn shutdown(&self) {}

    /// Backend identifier for logs and status lines
    fn backend_type(&self) -> CameraBackendType;
}

/// Create the camera backend selected in the config
pub fn open_camera(config: &Config) -> Arc<dyn CameraDevice> {
    match config.backend {
        CameraBackendType::V4l2 => Arc::new(V4l2Camera::new(config)),
        CameraBackendType::Synthetic => Arc::new(SyntheticCamera::new()),
    }
}

/// Enumerate cameras for the given backend
pub fn list_cameras(backend: CameraBackendType) -> Vec<CameraInfo> {
    match backend {
        CameraBackendType::V4l2 => v4l2::enumerate_cameras(),
        CameraBackendType::Synthetic => vec![CameraInfo {
            index: 0,
            name: "Synthetic test pattern".to_string(),
            path: "synthetic".to_string(),
        }],
    }
}
