// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapcam::backends::camera::{CameraBackendType, Facing};
use snapcam::config::{Config, PermissionSource};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "snapcam")]
#[command(about = "Take a photo, review it, and save it to your photo library")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/snapcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the synthetic test-pattern camera
    #[arg(long, global = true)]
    synthetic: bool,

    /// Ask the desktop portal for camera access
    #[arg(long, global = true)]
    portal: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (default)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo and save it without review
    Photo {
        /// Camera to use
        #[arg(short, long, value_enum, default_value_t = Facing::Back)]
        facing: Facing,

        /// Fire the flash
        #[arg(long)]
        flash: bool,

        /// Output directory (default: ~/Pictures/snapcam)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=snapcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref());
    if cli.synthetic {
        config.backend = CameraBackendType::Synthetic;
    }
    if cli.portal {
        config.permission_source = PermissionSource::Portal;
    }

    match cli.command {
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo {
            facing,
            flash,
            output,
        }) => cli::take_photo(config, facing, flash, output),
        Some(Commands::Terminal) | None => snapcam::terminal::run(config),
    }
}
