// SPDX-License-Identifier: GPL-3.0-only

//! Capture session
//!
//! One session per app run. The [`CaptureSessionController`] owns the
//! [`SessionState`], resolves permissions, talks to the camera and the media
//! store, and hands frontends a [`SessionView`] to render.

pub mod controller;
pub mod state;

pub use controller::CaptureSessionController;
pub use state::{Action, SessionPhase, SessionState};

use crate::backends::camera::{Facing, ImageHandle};
use crate::flash::FlashMode;
use crate::permissions::PermissionStatus;

/// What a frontend should show, derived from the session state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    /// Permission prompts are still outstanding
    PermissionPending,
    /// Camera access denied; nothing to do but quit
    Blocked {
        camera: PermissionStatus,
        media: PermissionStatus,
    },
    /// Live feed from the selected camera
    LivePreview {
        facing: Facing,
        flash: FlashMode,
        can_save: bool,
    },
    /// Reviewing a captured image
    CapturedPreview { image: ImageHandle, can_save: bool },
}

impl From<&SessionState> for SessionView {
    fn from(state: &SessionState) -> Self {
        match (state.phase(), state.captured_image()) {
            (SessionPhase::AwaitingPermissions, _) => SessionView::PermissionPending,
            (SessionPhase::Blocked, _) => SessionView::Blocked {
                camera: state.camera_permission(),
                media: state.media_permission(),
            },
            (SessionPhase::CapturedPreview, Some(image)) => SessionView::CapturedPreview {
                image: image.clone(),
                can_save: state.can_save(),
            },
            (SessionPhase::LivePreview | SessionPhase::CapturedPreview, _) => {
                SessionView::LivePreview {
                    facing: state.facing(),
                    flash: state.flash(),
                    can_save: state.can_save(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A one-shot message for the user (e.g. the "Saved!" alert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}
