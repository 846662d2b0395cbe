// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use snapcam::Config;
use snapcam::backends::camera::CameraBackendType;
use snapcam::config::PermissionSource;
use snapcam::storage::photo_directory;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.backend, CameraBackendType::V4l2);
    assert_eq!(config.permission_source, PermissionSource::Device);
    assert_eq!(config.capture_quality, 1.0, "Capture at maximum quality by default");
    assert!(config.front_device.is_none());
    assert!(config.back_device.is_none());
}

#[test]
fn test_config_roundtrips_through_json() {
    let config = Config {
        backend: CameraBackendType::Synthetic,
        permission_source: PermissionSource::Portal,
        back_device: Some("/dev/video0".into()),
        ..Config::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"portal\""));
    assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
}

#[test]
fn test_config_file_sets_library_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let photos = dir.path().join("photos");
    std::fs::write(
        &path,
        format!(r#"{{ "photo_directory": {:?} }}"#, photos.display().to_string()),
    )
    .unwrap();

    let config = Config::load(Some(&path));
    assert_eq!(photo_directory(&config), photos);
}
