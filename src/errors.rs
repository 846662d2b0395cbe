// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application

use crate::backends::camera::BackendError;
use crate::permissions::PermissionStatus;
use crate::session::Action;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Failures of a capture session action
///
/// Each variant matches one of the session's failure classes: permission
/// denial is terminal, capture failures can be retried, persist failures keep
/// the captured image so the user can retry or retake.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// Camera (or media) access was refused; the session is blocked
    #[error("Permission denied (camera: {camera}, media library: {media})")]
    PermissionDenied {
        camera: PermissionStatus,
        media: PermissionStatus,
    },
    /// The camera could not produce a still image
    #[error("Capture failed: {0}")]
    CaptureFailed(#[from] BackendError),
    /// The media store could not persist the captured image
    #[error("Save failed: {0}")]
    PersistFailed(#[from] PersistError),
    /// The action is not valid in the current state
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

/// Rejected state-machine transitions
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// `initialize` was called a second time
    #[error("Session is already initialized")]
    AlreadyInitialized,
    /// Permissions have not been resolved yet
    #[error("{action} is not available while permissions are pending")]
    PermissionsPending { action: Action },
    /// Camera permission was denied; nothing but quitting is possible
    #[error("{action} is not available: camera access was denied")]
    Blocked { action: Action },
    /// The action needs a captured image and none is held
    #[error("{action} requires a captured image")]
    NoCapturedImage { action: Action },
    /// The action is only available in live preview
    #[error("{action} is not available while reviewing a captured image")]
    ImageAlreadyCaptured { action: Action },
    /// Saving requires media library access
    #[error("Saving is not available: media library access was denied")]
    MediaPermissionDenied,
}

/// Media store failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistError {
    /// The photo library directory is not writable
    #[error("Photo library is not writable: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// The captured artifact could not be encoded
    #[error("Encoding failed: {0}")]
    Encoding(String),
    /// Writing the file failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::Io(err.to_string())
    }
}
