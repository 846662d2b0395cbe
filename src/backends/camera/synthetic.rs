// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera producing an animated test pattern
//!
//! Used when no hardware is present (CI, containers, demos). Frames are
//! generated on demand from the elapsed time, so there is no thread to manage.
//! Back and front cameras get different color schemes and the flash brightens
//! the captured still, which makes settings changes visible on screen.

use super::CameraDevice;
use super::types::*;
use crate::constants::{preview, timing};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::sync::Mutex;
use std::time::Instant;
use tracing::info;

/// Test-pattern camera
pub struct SyntheticCamera {
    started: Instant,
    width: u32,
    height: u32,
    preview: Mutex<PreviewConfig>,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self::with_size(preview::SYNTHETIC_WIDTH, preview::SYNTHETIC_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            started: Instant::now(),
            width: width.max(1),
            height: height.max(1),
            preview: Mutex::new(PreviewConfig::default()),
        }
    }

    fn current_config(&self) -> PreviewConfig {
        *self
            .preview
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Render the pattern at the current animation step
    fn render(&self, config: PreviewConfig, flash_lit: bool) -> CameraFrame {
        let step = (self.started.elapsed().as_millis() / timing::SYNTHETIC_FRAME_PERIOD.as_millis())
            as u32;
        let (w, h) = (self.width, self.height);
        let boost: u16 = if flash_lit { 80 } else { 0 };

        let image = RgbImage::from_fn(w, h, |x, y| {
            // Diagonal bands scrolling one pixel per frame
            let band = ((x + y + step) / 32) % 2 == 0;
            let fx = (x * 255 / w) as u16;
            let fy = (y * 255 / h) as u16;
            let (r, g, b) = match config.facing {
                Facing::Back => (fx, fy, if band { 160 } else { 60 }),
                Facing::Front => (if band { 200 } else { 90 }, fx, fy),
            };
            let lift = |c: u16| (c + boost).min(255) as u8;
            Rgb([lift(r), lift(g), lift(b)])
        });
        CameraFrame::from_image(image)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for SyntheticCamera {
    fn configure(&self, config: PreviewConfig) -> BackendResult<()> {
        *self
            .preview
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = config;
        Ok(())
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        Some(self.render(self.current_config(), false))
    }

    async fn capture_still(&self, quality: CaptureQuality) -> BackendResult<ImageHandle> {
        let config = self.current_config();
        info!(facing = %config.facing, flash = %config.flash, "Capturing synthetic still");

        let frame = self.render(config, config.flash.is_on());
        tokio::task::spawn_blocking(move || ImageHandle::encode(frame, config.facing, quality))
            .await
            .map_err(|e| BackendError::CaptureFailed(format!("Encoding task error: {}", e)))?
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Synthetic
    }
}
