// SPDX-License-Identifier: GPL-3.0-only

//! Session state and transition rules
//!
//! ```text
//!                        camera granted
//!  AwaitingPermissions ─────────────────▶ LivePreview ◀──────────┐
//!          │                                │    ▲               │
//!          │ camera denied          capture │    │ retake /      │ save failed
//!          ▼                                ▼    │ save          │
//!       Blocked                        CapturedPreview ──────────┘
//! ```
//!
//! Every user action is checked with [`SessionState::validate`] before it
//! runs, so an illegal action is a typed error rather than a hidden button.

use crate::backends::camera::{Facing, ImageHandle, PreviewConfig};
use crate::errors::TransitionError;
use crate::flash::FlashMode;
use crate::permissions::PermissionStatus;

/// User-initiated actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Capture,
    Retake,
    Save,
    ToggleFacing,
    ToggleFlash,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Capture,
        Action::Retake,
        Action::Save,
        Action::ToggleFacing,
        Action::ToggleFlash,
    ];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Capture => write!(f, "capture"),
            Action::Retake => write!(f, "retake"),
            Action::Save => write!(f, "save"),
            Action::ToggleFacing => write!(f, "toggle facing"),
            Action::ToggleFlash => write!(f, "toggle flash"),
        }
    }
}

/// Phase of the session, derived from [`SessionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Permission requests have not resolved yet
    AwaitingPermissions,
    /// Camera access was denied; the user must grant it outside the app
    Blocked,
    /// Live camera feed, no captured image held
    LivePreview,
    /// Reviewing a captured image
    CapturedPreview,
}

/// All mutable session data
///
/// Lives only in memory; a new process starts from [`SessionState::default`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    camera_permission: PermissionStatus,
    media_permission: PermissionStatus,
    facing: Facing,
    flash: FlashMode,
    captured_image: Option<ImageHandle>,
}

impl SessionState {
    pub fn camera_permission(&self) -> PermissionStatus {
        self.camera_permission
    }

    pub fn media_permission(&self) -> PermissionStatus {
        self.media_permission
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn flash(&self) -> FlashMode {
        self.flash
    }

    pub fn captured_image(&self) -> Option<&ImageHandle> {
        self.captured_image.as_ref()
    }

    /// Settings for the live preview surface
    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig {
            facing: self.facing,
            flash: self.flash,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.camera_permission == PermissionStatus::Unknown
            || self.media_permission == PermissionStatus::Unknown
        {
            SessionPhase::AwaitingPermissions
        } else if self.camera_permission.is_denied() {
            SessionPhase::Blocked
        } else if self.captured_image.is_some() {
            SessionPhase::CapturedPreview
        } else {
            SessionPhase::LivePreview
        }
    }

    /// Whether a captured image could be saved (media library accessible)
    pub fn can_save(&self) -> bool {
        self.media_permission.is_granted()
    }

    /// Check whether `action` is allowed right now
    pub fn validate(&self, action: Action) -> Result<(), TransitionError> {
        use Action::*;
        match (self.phase(), action) {
            (SessionPhase::AwaitingPermissions, action) => {
                Err(TransitionError::PermissionsPending { action })
            }
            (SessionPhase::Blocked, action) => Err(TransitionError::Blocked { action }),
            (SessionPhase::LivePreview, Capture | ToggleFacing | ToggleFlash) => Ok(()),
            (SessionPhase::LivePreview, action @ (Retake | Save)) => {
                Err(TransitionError::NoCapturedImage { action })
            }
            (SessionPhase::CapturedPreview, Retake) => Ok(()),
            (SessionPhase::CapturedPreview, Save) if self.can_save() => Ok(()),
            (SessionPhase::CapturedPreview, Save) => Err(TransitionError::MediaPermissionDenied),
            (SessionPhase::CapturedPreview, action @ (Capture | ToggleFacing | ToggleFlash)) => {
                Err(TransitionError::ImageAlreadyCaptured { action })
            }
        }
    }

    /// Actions whose guards currently pass, in display order
    pub fn available_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.validate(*action).is_ok())
            .collect()
    }

    /// Record both permission answers (once per session)
    ///
    /// An `Unknown` answer is stored as `Denied`.
    pub(crate) fn resolve_permissions(
        &mut self,
        camera: PermissionStatus,
        media: PermissionStatus,
    ) -> Result<(), TransitionError> {
        if self.camera_permission != PermissionStatus::Unknown
            || self.media_permission != PermissionStatus::Unknown
        {
            return Err(TransitionError::AlreadyInitialized);
        }
        let settle = |status: PermissionStatus| {
            PermissionStatus::from_granted(status.is_granted())
        };
        self.camera_permission = settle(camera);
        self.media_permission = settle(media);
        Ok(())
    }

    pub(crate) fn hold_image(&mut self, image: ImageHandle) {
        self.captured_image = Some(image);
    }

    pub(crate) fn release_image(&mut self) -> Option<ImageHandle> {
        self.captured_image.take()
    }

    pub(crate) fn toggle_facing(&mut self) -> Facing {
        self.facing = self.facing.toggled();
        self.facing
    }

    pub(crate) fn toggle_flash(&mut self) -> FlashMode {
        self.flash = self.flash.toggled();
        self.flash
    }
}
