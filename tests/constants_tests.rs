// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use snapcam::backends::camera::CaptureQuality;
use snapcam::constants::{SAVED_MESSAGE, SAVED_TITLE, jpeg, timing};

#[test]
fn test_saved_alert_text() {
    assert_eq!(SAVED_TITLE, "Saved!");
    assert_eq!(SAVED_MESSAGE, "Image has been saved to gallery.");
}

#[test]
fn test_capture_quality_maps_into_jpeg_range() {
    assert_eq!(CaptureQuality::MAX.jpeg_quality(), jpeg::MAX_QUALITY);
    assert_eq!(CaptureQuality::new(0.0).jpeg_quality(), jpeg::MIN_QUALITY);
    assert_eq!(CaptureQuality::new(7.5).jpeg_quality(), jpeg::MAX_QUALITY);
    assert_eq!(CaptureQuality::new(f32::NAN), CaptureQuality::MAX);
}

#[test]
fn test_frame_wait_outlasts_ui_tick() {
    assert!(timing::FRAME_WAIT > timing::UI_TICK);
    assert!(timing::FRAME_POLL < timing::FRAME_WAIT);
}
