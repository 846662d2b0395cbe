// SPDX-License-Identifier: GPL-3.0-only

//! Photo library location and file naming

use crate::config::Config;
use crate::constants::{PHOTO_FILENAME_PREFIX, PHOTO_TIMESTAMP_FORMAT};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory photos are saved to
///
/// `photo_directory` from the config if set, otherwise
/// `<Pictures>/<album>` with Pictures resolved through XDG user dirs.
pub fn photo_directory(config: &Config) -> PathBuf {
    if let Some(dir) = &config.photo_directory {
        return dir.clone();
    }
    let pictures = dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."));
    pictures.join(&config.album)
}

/// File name for a photo taken at `taken_at`, with an optional collision suffix
///
/// `IMG_20250101_120000.jpg`, `IMG_20250101_120000_1.jpg`, ...
pub fn photo_file_name(taken_at: DateTime<Local>, attempt: u32) -> String {
    let timestamp = taken_at.format(PHOTO_TIMESTAMP_FORMAT);
    if attempt == 0 {
        format!("{}_{}.jpg", PHOTO_FILENAME_PREFIX, timestamp)
    } else {
        format!("{}_{}_{}.jpg", PHOTO_FILENAME_PREFIX, timestamp, attempt)
    }
}

/// Most recently modified JPEG/PNG in `photos_dir`
pub async fn latest_photo(photos_dir: PathBuf) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(&photos_dir).await.ok()?;
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !is_photo(&path) {
            continue;
        }
        let Some(modified) = entry.metadata().await.ok().and_then(|m| m.modified().ok()) else {
            continue;
        };
        if latest.as_ref().is_none_or(|(newest, _)| modified > *newest) {
            latest = Some((modified, path));
        }
    }

    let latest = latest.map(|(_, path)| path);
    debug!(path = ?latest, "Latest photo");
    latest
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("jpg")
                || ext.eq_ignore_ascii_case("jpeg")
                || ext.eq_ignore_ascii_case("png")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_photo_file_names() {
        let taken_at = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(photo_file_name(taken_at, 0), "IMG_20250307_090501.jpg");
        assert_eq!(photo_file_name(taken_at, 2), "IMG_20250307_090501_2.jpg");
    }

    #[test]
    fn test_configured_directory_wins() {
        let config = Config {
            photo_directory: Some(PathBuf::from("/tmp/shots")),
            ..Config::default()
        };
        assert_eq!(photo_directory(&config), PathBuf::from("/tmp/shots"));
    }

    #[test]
    fn test_default_directory_ends_with_album() {
        let config = Config::default();
        assert!(photo_directory(&config).ends_with(&config.album));
    }

    #[tokio::test]
    async fn test_latest_photo_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_photo(dir.path().to_path_buf()).await, None);

        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("IMG_1.jpg"), b"x").unwrap();
        assert_eq!(
            latest_photo(dir.path().to_path_buf()).await,
            Some(dir.path().join("IMG_1.jpg"))
        );
    }
}
