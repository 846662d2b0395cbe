// SPDX-License-Identifier: GPL-3.0-only

//! Permission checks against the filesystem
//!
//! On a plain Linux system camera access is governed by the permissions on
//! `/dev/videoN` (usually the `video` group) and the photo library is just a
//! directory. Both are checked with `access(2)`, which honors group
//! membership, ACLs and read-only mounts.

use super::{PermissionGateway, PermissionStatus};
use async_trait::async_trait;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Whether the current user may access `path` with the given `access(2)` mode
pub fn has_access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

#[derive(Debug, Clone)]
enum CameraCheck {
    /// Check read/write access on this device node
    Node(Option<PathBuf>),
    /// No device node backs the camera; always granted
    Skip,
}

/// Gateway that inspects device node and library directory permissions
#[derive(Debug, Clone)]
pub struct DevicePermissionGateway {
    camera: CameraCheck,
    library: PathBuf,
}

impl DevicePermissionGateway {
    /// `camera_device` is `None` when no camera was found, which is a denial
    pub fn new(camera_device: Option<String>, library: PathBuf) -> Self {
        Self {
            camera: CameraCheck::Node(camera_device.map(PathBuf::from)),
            library,
        }
    }

    /// Gateway for cameras without a device node (synthetic)
    pub fn without_camera(library: PathBuf) -> Self {
        Self {
            camera: CameraCheck::Skip,
            library,
        }
    }
}

/// Media-library check shared by every gateway
///
/// Creates the library directory if needed, then requires write and search
/// access on it.
pub async fn check_library_access(library: &Path) -> PermissionStatus {
    if let Err(e) = tokio::fs::create_dir_all(library).await {
        warn!(path = %library.display(), error = %e, "Cannot create photo library");
        return PermissionStatus::Denied;
    }
    let granted = has_access(library, libc::W_OK | libc::X_OK);
    if !granted {
        warn!(path = %library.display(), "Photo library is not writable");
    }
    info!(path = %library.display(), granted, "Media library permission");
    PermissionStatus::from_granted(granted)
}

#[async_trait]
impl PermissionGateway for DevicePermissionGateway {
    async fn request_camera_permission(&self) -> PermissionStatus {
        let path = match &self.camera {
            CameraCheck::Skip => return PermissionStatus::Granted,
            CameraCheck::Node(None) => {
                warn!("No camera device found");
                return PermissionStatus::Denied;
            }
            CameraCheck::Node(Some(path)) => path,
        };

        let granted = has_access(path, libc::R_OK | libc::W_OK);
        if !granted {
            warn!(
                device = %path.display(),
                "Camera device not accessible (is the user in the 'video' group?)"
            );
        }
        info!(device = %path.display(), granted, "Camera permission");
        PermissionStatus::from_granted(granted)
    }

    async fn request_media_permission(&self) -> PermissionStatus {
        check_library_access(&self.library).await
    }
}
