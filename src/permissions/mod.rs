// SPDX-License-Identifier: GPL-3.0-only

//! Camera and media-library permission gateways
//!
//! A gateway answers two independent questions: may we use the camera, and
//! may we write to the photo library. Both are asked once per session.

pub mod device;
pub mod portal;

pub use device::DevicePermissionGateway;
pub use portal::PortalPermissionGateway;

use crate::backends::camera::Facing;
use crate::config::{Config, PermissionSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// Not asked yet
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }

    pub fn is_denied(self) -> bool {
        self == PermissionStatus::Denied
    }

    /// `Granted` for true, `Denied` for false
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Unknown => write!(f, "unknown"),
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
        }
    }
}

/// Grants or denies camera and media-library access
///
/// Requests are independent and may be issued in any order or concurrently.
/// Implementations must be idempotent: asking twice yields the same answer
/// unless the user changed something outside the app. Failures to determine
/// access are reported as `Denied`.
#[async_trait]
pub trait PermissionGateway: Send + Sync {
    async fn request_camera_permission(&self) -> PermissionStatus;

    async fn request_media_permission(&self) -> PermissionStatus;
}

/// Gateway with predetermined answers, for embedding and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedPermissionGateway {
    pub camera: PermissionStatus,
    pub media: PermissionStatus,
}

impl FixedPermissionGateway {
    pub fn granted() -> Self {
        Self {
            camera: PermissionStatus::Granted,
            media: PermissionStatus::Granted,
        }
    }
}

#[async_trait]
impl PermissionGateway for FixedPermissionGateway {
    async fn request_camera_permission(&self) -> PermissionStatus {
        self.camera
    }

    async fn request_media_permission(&self) -> PermissionStatus {
        self.media
    }
}

/// Create the permission gateway selected in the config
///
/// The synthetic backend has no device node, so only the photo library is
/// actually checked.
pub fn gateway_for(config: &Config) -> Arc<dyn PermissionGateway> {
    use crate::backends::camera::CameraBackendType;

    let library = crate::storage::photo_directory(config);
    match (config.backend, config.permission_source) {
        (CameraBackendType::Synthetic, _) => Arc::new(DevicePermissionGateway::without_camera(library)),
        (CameraBackendType::V4l2, PermissionSource::Device) => {
            let camera_path = config
                .device_for_facing(Facing::Back)
                .map(str::to_string)
                .or_else(|| {
                    crate::backends::camera::v4l2::enumerate_cameras()
                        .into_iter()
                        .next()
                        .map(|cam| cam.path)
                });
            Arc::new(DevicePermissionGateway::new(camera_path, library))
        }
        (CameraBackendType::V4l2, PermissionSource::Portal) => {
            Arc::new(PortalPermissionGateway::new(library))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        assert_eq!(PermissionStatus::default(), PermissionStatus::Unknown);
        assert!(PermissionStatus::from_granted(true).is_granted());
        assert!(PermissionStatus::from_granted(false).is_denied());
        assert!(!PermissionStatus::Unknown.is_granted());
        assert!(!PermissionStatus::Unknown.is_denied());
    }

    #[tokio::test]
    async fn test_fixed_gateway_answers_independently() {
        let gateway = FixedPermissionGateway {
            camera: PermissionStatus::Granted,
            media: PermissionStatus::Denied,
        };
        assert_eq!(
            gateway.request_camera_permission().await,
            PermissionStatus::Granted
        );
        assert_eq!(
            gateway.request_media_permission().await,
            PermissionStatus::Denied
        );
        // Idempotent
        assert_eq!(
            gateway.request_media_permission().await,
            PermissionStatus::Denied
        );
    }
}
