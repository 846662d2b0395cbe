// SPDX-License-Identifier: GPL-3.0-only

//! XDG desktop portal camera permission
//!
//! Sandboxed apps (Flatpak) must ask `org.freedesktop.portal.Camera` for
//! camera access; the desktop shows the prompt and remembers the answer. The
//! request is asynchronous: `AccessCamera` returns a request object that later
//! emits a `Response` signal carrying the user's decision.

use super::device::check_library_access;
use super::{PermissionGateway, PermissionStatus};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Portal response code for "user granted the request"
const RESPONSE_SUCCESS: u32 = 0;

/// Gateway that asks the desktop portal for camera access
///
/// The media library has no portal of its own for direct file writes, so it
/// is checked on the filesystem exactly like [`super::DevicePermissionGateway`].
#[derive(Debug, Clone)]
pub struct PortalPermissionGateway {
    library: PathBuf,
}

impl PortalPermissionGateway {
    pub fn new(library: PathBuf) -> Self {
        Self { library }
    }
}

/// Object path the portal will use for a request with `token`
///
/// The portal derives it from our unique bus name (`:1.42` → `1_42`), which
/// lets us subscribe to `Response` before issuing the call.
pub fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_PATH, sender, token)
}

/// Ask the portal; any D-Bus failure is an error, a refusal is `Ok(false)`
async fn access_camera() -> Result<bool, String> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DESTINATION, PORTAL_PATH, CAMERA_INTERFACE)
        .await
        .map_err(|e| format!("Failed to create camera portal proxy: {}", e))?;

    let present: bool = camera
        .get_property("IsCameraPresent")
        .await
        .map_err(|e| format!("Camera portal unavailable: {}", e))?;
    if !present {
        info!("Camera portal reports no camera present");
        return Ok(false);
    }

    let unique_name = connection
        .unique_name()
        .ok_or("D-Bus connection has no unique name")?
        .to_string();
    let token = format!("snapcam_{}", uuid::Uuid::new_v4().simple());
    let expected_path = request_path(&unique_name, &token);

    let request = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        expected_path.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(|e| format!("Failed to create request proxy: {}", e))?;
    let mut responses = request
        .receive_signal("Response")
        .await
        .map_err(|e| format!("Failed to subscribe to portal response: {}", e))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::new(token.as_str()));
    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| format!("AccessCamera failed: {}", e))?;

    if handle.as_str() != expected_path {
        // Old portals ignore handle_token; our subscription would never fire
        warn!(handle = %handle.as_str(), expected = %expected_path, "Unexpected portal request path");
        return Err("Portal returned an unexpected request path".to_string());
    }
    debug!(handle = %handle.as_str(), "Waiting for camera portal response");

    let message = responses
        .next()
        .await
        .ok_or("Portal closed the request without answering")?;
    let (code, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| format!("Malformed portal response: {}", e))?;

    Ok(code == RESPONSE_SUCCESS)
}

#[async_trait]
impl PermissionGateway for PortalPermissionGateway {
    async fn request_camera_permission(&self) -> PermissionStatus {
        match access_camera().await {
            Ok(granted) => {
                info!(granted, "Camera portal answered");
                PermissionStatus::from_granted(granted)
            }
            Err(e) => {
                warn!(error = %e, "Camera portal request failed");
                PermissionStatus::Denied
            }
        }
    }

    async fn request_media_permission(&self) -> PermissionStatus {
        check_library_access(&self.library).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_from_unique_name() {
        assert_eq!(
            request_path(":1.42", "snapcam_abc"),
            "/org/freedesktop/portal/desktop/request/1_42/snapcam_abc"
        );
    }
}
