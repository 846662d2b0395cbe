// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo without the interactive frontend

use snapcam::backends::camera::{self, CaptureQuality, Facing};
use snapcam::config::Config;
use snapcam::media::{PhotoLibrary, SavedPhoto};
use snapcam::permissions;
use snapcam::session::CaptureSessionController;
use snapcam::storage;
use std::path::PathBuf;
use std::sync::Arc;

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = camera::list_cameras(config.backend);

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", config.backend);
    println!();
    for info in &cameras {
        println!("  [{}] {}", info.index, info.name);
        println!("      Device: {}", info.path);
        for facing in [Facing::Back, Facing::Front] {
            if config.device_for_facing(facing) == Some(info.path.as_str()) {
                println!("      Configured as: {}", facing);
            }
        }
        println!();
    }

    Ok(())
}

/// Take a single photo through a capture session and save it
pub fn take_photo(
    mut config: Config,
    facing: Facing,
    flash: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    // The output directory replaces the library for permission checks too
    if let Some(dir) = output {
        config.photo_directory = Some(dir);
    }
    let library_dir = storage::photo_directory(&config);
    let device = camera::open_camera(&config);

    let mut session = CaptureSessionController::new(
        permissions::gateway_for(&config),
        device,
        Arc::new(PhotoLibrary::new(library_dir)),
    )
    .with_quality(CaptureQuality::new(config.capture_quality));

    let rt = tokio::runtime::Runtime::new()?;
    let saved = rt.block_on(capture_and_save(&mut session, facing, flash));
    session.shutdown();

    println!("Photo saved: {}", saved?.path.display());
    Ok(())
}

async fn capture_and_save(
    session: &mut CaptureSessionController,
    facing: Facing,
    flash: bool,
) -> Result<SavedPhoto, Box<dyn std::error::Error>> {
    session.initialize().await?;
    if !session.state().can_save() {
        return Err("Photo library is not writable".into());
    }
    if session.state().facing() != facing {
        session.toggle_facing()?;
    }
    if session.state().flash().is_on() != flash {
        session.toggle_flash()?;
    }

    println!("Capturing ({} camera, flash {})...", facing, session.state().flash());
    session.capture().await?;
    Ok(session.save().await?)
}
