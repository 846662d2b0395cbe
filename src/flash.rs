// SPDX-License-Identifier: GPL-3.0-only

//! Flash mode and hardware flash LED control via Linux sysfs
//!
//! Flash LEDs are exposed at `/sys/class/leds/*:flash`. We drive them through
//! the `brightness` file (torch mode), which is group-writable on phones
//! running `feedbackd`; the root-only strobe interface is never touched.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LEDS_DIR: &str = "/sys/class/leds";

/// Flash setting for still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Flash stays off
    #[default]
    Off,
    /// Flash fires for the duration of a still capture
    On,
}

impl FlashMode {
    /// Off <-> On
    pub fn toggled(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == FlashMode::On
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashMode::Off => write!(f, "off"),
            FlashMode::On => write!(f, "on"),
        }
    }
}

/// A writable flash LED discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Value of `max_brightness`
    max_brightness: u32,
    /// Directory basename
    name: String,
}

impl FlashDevice {
    /// Probe one `/sys/class/leds/<name>` directory
    fn probe(led_path: PathBuf) -> Option<FlashDevice> {
        let name = led_path.file_name()?.to_str()?.to_string();
        if !name.ends_with(":flash") {
            return None;
        }

        let max_brightness_path = led_path.join("max_brightness");
        let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
            Ok(s) => match s.trim().parse::<u32>() {
                Ok(v) if v > 0 => v,
                _ => {
                    warn!(path = %max_brightness_path.display(), "Invalid max_brightness value");
                    return None;
                }
            },
            Err(e) => {
                warn!(path = %max_brightness_path.display(), error = %e, "Cannot read max_brightness");
                return None;
            }
        };

        let brightness_path = led_path.join("brightness");
        if let Err(e) = std::fs::OpenOptions::new()
            .write(true)
            .open(&brightness_path)
        {
            warn!(
                path = %brightness_path.display(),
                error = %e,
                "Flash LED found but not writable (is the user in the 'feedbackd' group?)"
            );
            return None;
        }

        info!(name = %name, max_brightness, "Discovered flash LED");
        Some(FlashDevice {
            path: led_path,
            max_brightness,
            name,
        })
    }

    /// Device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        std::fs::write(
            self.path.join("brightness"),
            value.min(self.max_brightness).to_string(),
        )
    }
}

/// All controllable flash LEDs on this machine
#[derive(Debug, Clone, Default)]
pub struct FlashHardware {
    devices: Vec<FlashDevice>,
}

impl FlashHardware {
    /// Scan `/sys/class/leds` for writable `*:flash` entries
    pub fn detect() -> Self {
        Self::detect_in(Path::new(LEDS_DIR))
    }

    /// Scan a sysfs-style LED directory
    pub fn detect_in(leds_dir: &Path) -> Self {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            debug!(path = %leds_dir.display(), "No LED class directory, flash unavailable");
            return Self::default();
        };

        let mut devices: Vec<FlashDevice> = entries
            .flatten()
            .filter_map(|entry| FlashDevice::probe(entry.path()))
            .collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        Self { devices }
    }

    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    pub fn devices(&self) -> &[FlashDevice] {
        &self.devices
    }

    /// Light every LED at full brightness
    pub fn all_on(&self) {
        for dev in &self.devices {
            if let Err(e) = dev.set_brightness(dev.max_brightness) {
                warn!(device = %dev.name, error = %e, "Failed to turn on flash LED");
            }
        }
    }

    /// Turn every LED off
    pub fn all_off(&self) {
        for dev in &self.devices {
            if let Err(e) = dev.set_brightness(0) {
                warn!(device = %dev.name, error = %e, "Failed to turn off flash LED");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_led(dir: &Path, name: &str, max: &str) -> PathBuf {
        let led = dir.join(name);
        std::fs::create_dir_all(&led).unwrap();
        std::fs::write(led.join("max_brightness"), max).unwrap();
        std::fs::write(led.join("brightness"), "0").unwrap();
        led
    }

    #[test]
    fn test_flash_mode_toggles_between_off_and_on() {
        assert_eq!(FlashMode::default(), FlashMode::Off);
        assert_eq!(FlashMode::Off.toggled(), FlashMode::On);
        assert_eq!(FlashMode::On.toggled(), FlashMode::Off);
    }

    #[test]
    fn test_detect_only_flash_leds() {
        let dir = tempfile::tempdir().unwrap();
        fake_led(dir.path(), "white:flash", "255\n");
        fake_led(dir.path(), "red:status", "1");
        fake_led(dir.path(), "yellow:flash", "0");

        let hw = FlashHardware::detect_in(dir.path());
        let names: Vec<_> = hw.devices().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["white:flash"]);
    }

    #[test]
    fn test_all_on_writes_max_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let led = fake_led(dir.path(), "white:flash", "17");

        let hw = FlashHardware::detect_in(dir.path());
        hw.all_on();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "17");
        hw.all_off();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "0");
    }

    #[test]
    fn test_missing_leds_dir_yields_no_devices() {
        let hw = FlashHardware::detect_in(Path::new("/nonexistent/leds"));
        assert!(!hw.has_devices());
    }
}
