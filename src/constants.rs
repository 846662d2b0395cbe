// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier used for config and photo directories
pub const APP_NAME: &str = "snapcam";

/// Default photo album (subdirectory of the user's Pictures folder)
pub const DEFAULT_ALBUM: &str = "snapcam";

/// Prefix for saved photo filenames (`IMG_20250101_120000.jpg`)
pub const PHOTO_FILENAME_PREFIX: &str = "IMG";

/// Timestamp format used in saved photo filenames
pub const PHOTO_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Title of the alert shown after a successful save
pub const SAVED_TITLE: &str = "Saved!";

/// Body of the alert shown after a successful save
pub const SAVED_MESSAGE: &str = "Image has been saved to gallery.";

/// Preview / capture timing
pub mod timing {
    use super::Duration;

    /// How long a still capture waits for a fresh frame before the device
    /// is reported busy
    pub const FRAME_WAIT: Duration = Duration::from_secs(3);

    /// Poll interval while waiting for a fresh frame
    pub const FRAME_POLL: Duration = Duration::from_millis(10);

    /// Default time the flash LED is lit before the frame is taken
    pub const FLASH_SETTLE_MS: u64 = 300;

    /// Terminal UI input poll interval (one frame at ~60 fps)
    pub const UI_TICK: Duration = Duration::from_millis(16);

    /// Synthetic camera frame period
    pub const SYNTHETIC_FRAME_PERIOD: Duration = Duration::from_millis(33);
}

/// Preview resolution defaults
pub mod preview {
    /// Default preview / capture width requested from V4L2 devices
    pub const DEFAULT_WIDTH: u32 = 1280;

    /// Default preview / capture height requested from V4L2 devices
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// Synthetic camera frame width
    pub const SYNTHETIC_WIDTH: u32 = 640;

    /// Synthetic camera frame height
    pub const SYNTHETIC_HEIGHT: u32 = 480;

    /// Number of mmap buffers for the V4L2 capture stream
    pub const V4L2_BUFFER_COUNT: u32 = 4;
}

/// JPEG quality bounds (the `image` encoder accepts 1..=100)
pub mod jpeg {
    pub const MIN_QUALITY: u8 = 1;
    pub const MAX_QUALITY: u8 = 100;
}
