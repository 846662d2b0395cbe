// SPDX-License-Identifier: GPL-3.0-only

//! Media store: where captured photos end up
//!
//! ```text
//! ImageHandle (in-memory JPEG) → MediaStore::persist → ~/Pictures/<album>/IMG_*.jpg
//! ```

pub mod encoding;
pub mod library;

pub use library::PhotoLibrary;

use crate::backends::camera::ImageHandle;
use crate::errors::PersistError;
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Record of a successfully persisted photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPhoto {
    /// Id of the handle that was saved
    pub image_id: Uuid,
    /// Location in the user-visible collection
    pub path: PathBuf,
}

/// Durable, user-visible photo collection
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write the artifact into the collection
    ///
    /// The handle is borrowed; on failure the caller still owns the image and
    /// may retry.
    async fn persist(&self, image: &ImageHandle) -> Result<SavedPhoto, PersistError>;
}
