// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Drives the session state machine. Every action is validated against the
//! current [`SessionState`] first; a rejected action leaves the state exactly
//! as it was. The controller is used from a single task (`&mut self`), so a
//! save in flight can never race a retake.

use super::state::{Action, SessionPhase, SessionState};
use super::{Notice, SessionView};
use crate::backends::camera::{
    CameraDevice, CameraFrame, CaptureQuality, Facing, ImageHandle,
};
use crate::constants::{SAVED_MESSAGE, SAVED_TITLE};
use crate::errors::{SessionError, TransitionError};
use crate::flash::FlashMode;
use crate::media::{MediaStore, SavedPhoto};
use crate::permissions::PermissionGateway;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct CaptureSessionController {
    state: SessionState,
    permissions: Arc<dyn PermissionGateway>,
    camera: Arc<dyn CameraDevice>,
    media: Arc<dyn MediaStore>,
    quality: CaptureQuality,
    notice: Option<Notice>,
}

impl CaptureSessionController {
    /// New session in `AwaitingPermissions`, capturing at maximum quality
    pub fn new(
        permissions: Arc<dyn PermissionGateway>,
        camera: Arc<dyn CameraDevice>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            state: SessionState::default(),
            permissions,
            camera,
            media,
            quality: CaptureQuality::MAX,
            notice: None,
        }
    }

    pub fn with_quality(mut self, quality: CaptureQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(&self.state)
    }

    pub fn available_actions(&self) -> Vec<Action> {
        self.state.available_actions()
    }

    /// Pending notice, if any, without consuming it
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Consume the pending notice (the user dismissed it)
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Latest live frame, only while the live preview is showing
    pub fn preview_frame(&self) -> Option<CameraFrame> {
        if self.phase() == SessionPhase::LivePreview {
            self.camera.latest_frame()
        } else {
            None
        }
    }

    /// Ask for camera and media access and start the preview
    ///
    /// Both requests run concurrently. Returns the phase the session landed
    /// in; camera denial is reported as [`SessionError::PermissionDenied`]
    /// and leaves the session `Blocked`.
    pub async fn initialize(&mut self) -> Result<SessionPhase, SessionError> {
        if self.phase() != SessionPhase::AwaitingPermissions {
            return Err(TransitionError::AlreadyInitialized.into());
        }

        info!("Requesting camera and media permissions");
        let (camera, media) = tokio::join!(
            self.permissions.request_camera_permission(),
            self.permissions.request_media_permission()
        );
        self.state.resolve_permissions(camera, media)?;

        let camera = self.state.camera_permission();
        let media = self.state.media_permission();
        info!(%camera, %media, "Permissions resolved");

        if camera.is_denied() {
            warn!("Camera access denied, session blocked");
            return Err(SessionError::PermissionDenied { camera, media });
        }
        if media.is_denied() {
            warn!("Media library access denied, saving disabled");
        }

        if let Err(e) = self.camera.configure(self.state.preview_config()) {
            // The session is still live; capture reports the failure if the
            // device never comes up.
            error!(error = %e, backend = %self.camera.backend_type(), "Failed to start preview");
        }
        Ok(self.phase())
    }

    /// Take a still image and switch to the captured preview
    pub async fn capture(&mut self) -> Result<ImageHandle, SessionError> {
        self.state.validate(Action::Capture)?;

        info!(
            facing = %self.state.facing(),
            flash = %self.state.flash(),
            "Capturing photo..."
        );
        match self.camera.capture_still(self.quality).await {
            Ok(image) => {
                info!(id = %image.id(), width = image.width(), height = image.height(), "Photo captured");
                self.state.hold_image(image.clone());
                Ok(image)
            }
            Err(e) => {
                error!(error = %e, "Error taking picture");
                self.notice = Some(Notice::error("Capture failed", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Discard the captured image and return to the live preview
    pub fn retake(&mut self) -> Result<(), SessionError> {
        self.state.validate(Action::Retake)?;
        if let Some(image) = self.state.release_image() {
            debug!(id = %image.id(), "Discarded captured image");
        }
        Ok(())
    }

    /// Persist the captured image and return to the live preview
    ///
    /// On failure the image is kept so the user can retry or retake.
    pub async fn save(&mut self) -> Result<SavedPhoto, SessionError> {
        self.state.validate(Action::Save)?;
        let image = self
            .state
            .captured_image()
            .cloned()
            .ok_or(TransitionError::NoCapturedImage {
                action: Action::Save,
            })?;

        match self.media.persist(&image).await {
            Ok(saved) => {
                info!(path = %saved.path.display(), "Photo saved");
                self.state.release_image();
                self.notice = Some(Notice::info(SAVED_TITLE, SAVED_MESSAGE));
                Ok(saved)
            }
            Err(e) => {
                error!(error = %e, id = %image.id(), "Failed to save photo");
                self.notice = Some(Notice::error("Save failed", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Switch between the front and back camera
    pub fn toggle_facing(&mut self) -> Result<Facing, SessionError> {
        self.state.validate(Action::ToggleFacing)?;
        let facing = self.state.toggle_facing();
        info!(%facing, "Switched camera");
        self.push_preview_config();
        Ok(facing)
    }

    /// Switch the flash between off and on
    pub fn toggle_flash(&mut self) -> Result<FlashMode, SessionError> {
        self.state.validate(Action::ToggleFlash)?;
        let flash = self.state.toggle_flash();
        info!(%flash, "Flash mode changed");
        self.push_preview_config();
        Ok(flash)
    }

    /// Run any action by name, for frontends that map keys to actions
    pub async fn perform(&mut self, action: Action) -> Result<(), SessionError> {
        match action {
            Action::Capture => self.capture().await.map(|_| ()),
            Action::Retake => self.retake(),
            Action::Save => self.save().await.map(|_| ()),
            Action::ToggleFacing => self.toggle_facing().map(|_| ()),
            Action::ToggleFlash => self.toggle_flash().map(|_| ()),
        }
    }

    /// Stop the camera stream
    pub fn shutdown(&self) {
        self.camera.shutdown();
    }

    fn push_preview_config(&self) {
        if let Err(e) = self.camera.configure(self.state.preview_config()) {
            warn!(error = %e, "Camera did not accept preview settings");
        }
    }
}
