// SPDX-License-Identifier: GPL-3.0-only

//! Snapcam - take a photo, review it, save it
//!
//! This library provides the capture session behind the `snapcam` binary:
//! permission handling, a live camera preview, still capture, and saving to
//! the user's photo library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: Capture session state machine and controller
//! - [`permissions`]: Camera and photo library access
//! - [`backends`]: Camera backend abstraction (V4L2, synthetic)
//! - [`media`]: JPEG encoding and the photo library
//! - [`flash`]: Flash LED control
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo library location and file naming
//! - [`terminal`]: Terminal frontend
//!
//! # Example
//!
//! ```no_run
//! use snapcam::backends::camera::SyntheticCamera;
//! use snapcam::media::PhotoLibrary;
//! use snapcam::permissions::FixedPermissionGateway;
//! use snapcam::session::CaptureSessionController;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), snapcam::errors::SessionError> {
//! let mut session = CaptureSessionController::new(
//!     Arc::new(FixedPermissionGateway::granted()),
//!     Arc::new(SyntheticCamera::new()),
//!     Arc::new(PhotoLibrary::new("/tmp/snapcam".into())),
//! );
//! session.initialize().await?;
//! session.capture().await?;
//! session.save().await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod media;
pub mod permissions;
pub mod session;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, SessionError};
pub use session::{Action, CaptureSessionController, SessionPhase, SessionView};
