// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Read once at startup from `$XDG_CONFIG_HOME/snapcam/config.json`. The app
//! never writes it: facing and flash always start at back/off.

use crate::backends::camera::{CameraBackendType, Facing};
use crate::constants::{APP_NAME, CONFIG_FILE_NAME, DEFAULT_ALBUM, preview, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How camera permission is obtained
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionSource {
    /// Check access on the device node (`video` group membership)
    #[default]
    Device,
    /// Ask the XDG desktop portal (sandboxed installs)
    Portal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (V4L2 or Synthetic)
    pub backend: CameraBackendType,
    /// Device node of the front camera (e.g. "/dev/video2")
    pub front_device: Option<String>,
    /// Device node of the back camera (e.g. "/dev/video0")
    pub back_device: Option<String>,
    /// Where photos are saved; overrides Pictures/<album>
    pub photo_directory: Option<PathBuf>,
    /// Subdirectory of the Pictures folder
    pub album: String,
    /// Capture quality, 0.0 to 1.0
    pub capture_quality: f32,
    /// Where camera permission comes from
    pub permission_source: PermissionSource,
    /// Requested preview/capture width
    pub preview_width: u32,
    /// Requested preview/capture height
    pub preview_height: u32,
    /// Milliseconds the flash LED burns before the frame is taken
    pub flash_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            front_device: None,
            back_device: None,
            photo_directory: None,
            album: DEFAULT_ALBUM.to_string(),
            capture_quality: 1.0, // Maximum quality
            permission_source: PermissionSource::default(),
            preview_width: preview::DEFAULT_WIDTH,
            preview_height: preview::DEFAULT_HEIGHT,
            flash_settle_ms: timing::FLASH_SETTLE_MS,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the config, falling back to defaults
    ///
    /// A missing file is normal. An unreadable or malformed file is logged
    /// and ignored so a typo never keeps the camera from starting.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(error = %e, "Ignoring config file");
                Self::default()
            }
        }
    }

    /// Configured device node for a facing, if any
    pub fn device_for_facing(&self, facing: Facing) -> Option<&str> {
        match facing {
            Facing::Front => self.front_device.as_deref(),
            Facing::Back => self.back_device.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "backend": "Synthetic", "album": "holiday" }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.backend, CameraBackendType::Synthetic);
        assert_eq!(config.album, "holiday");
        assert_eq!(config.capture_quality, 1.0);
        assert_eq!(config.permission_source, PermissionSource::Device);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::from_file(&path), Err(AppError::Config(_))));
        assert_eq!(Config::load(Some(&path)), Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(Config::from_file(&path), Err(AppError::Storage(_))));
        assert_eq!(Config::load(Some(&path)), Config::default());
    }

    #[test]
    fn test_device_for_facing() {
        let config = Config {
            front_device: Some("/dev/video2".into()),
            ..Config::default()
        };
        assert_eq!(config.device_for_facing(Facing::Front), Some("/dev/video2"));
        assert_eq!(config.device_for_facing(Facing::Back), None);
    }
}
