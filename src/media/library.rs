// SPDX-License-Identifier: GPL-3.0-only

//! Photo library on the local filesystem

use super::{MediaStore, SavedPhoto};
use crate::backends::camera::ImageHandle;
use crate::errors::PersistError;
use crate::permissions::device::has_access;
use crate::storage::photo_file_name;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Give up finding a free file name after this many collisions
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Saves photos as JPEG files into one directory
#[derive(Debug, Clone)]
pub struct PhotoLibrary {
    directory: PathBuf,
}

impl PhotoLibrary {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Create a new file, never replacing an existing photo
    async fn create_unique(&self, image: &ImageHandle) -> Result<(PathBuf, tokio::fs::File), PersistError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.directory.join(photo_file_name(image.taken_at(), attempt));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    return Err(PersistError::PermissionDenied(self.directory.clone()));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(PersistError::Io(format!(
            "no free file name after {} attempts",
            MAX_NAME_ATTEMPTS
        )))
    }
}

#[async_trait]
impl MediaStore for PhotoLibrary {
    async fn persist(&self, image: &ImageHandle) -> Result<SavedPhoto, PersistError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        if !has_access(&self.directory, libc::W_OK | libc::X_OK) {
            return Err(PersistError::PermissionDenied(self.directory.clone()));
        }

        let (path, mut file) = self.create_unique(image).await?;
        info!(path = %path.display(), id = %image.id(), "Saving photo");

        let written = async {
            file.write_all(image.jpeg_bytes()).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "Write failed, removing partial file");
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }

        info!(path = %path.display(), "Photo saved successfully");
        Ok(SavedPhoto {
            image_id: image.id(),
            path,
        })
    }
}
