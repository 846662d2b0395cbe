// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 camera backend
//!
//! A dedicated capture thread streams frames from `/dev/videoN` through a
//! memory-mapped buffer queue and keeps the most recent decoded frame in a
//! shared slot. The preview reads that slot; still capture waits for a frame
//! newer than the request so the picture is never older than the button press.

use super::convert::{RawFormat, decode_buffer};
use super::types::*;
use super::CameraDevice;
use crate::config::Config;
use crate::constants::{preview, timing};
use crate::flash::FlashHardware;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Consecutive dequeue failures before the stream is declared dead
const MAX_CONSECUTIVE_ERRORS: u32 = 50;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the capture thread and the camera handle
#[derive(Default)]
struct SharedFrame {
    latest: Mutex<Option<CameraFrame>>,
    /// Set when the capture thread gives up (open failure, dead stream)
    failure: Mutex<Option<BackendError>>,
}

impl SharedFrame {
    fn reset(&self) {
        *lock(&self.latest) = None;
        *lock(&self.failure) = None;
    }
}

/// A running capture thread bound to one device node
struct CaptureThread {
    device_path: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureThread {
    fn spawn(device_path: String, width: u32, height: u32, shared: Arc<SharedFrame>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let thread_path = device_path.clone();

        let handle = std::thread::Builder::new()
            .name("v4l2-capture".into())
            .spawn(move || {
                if let Err(e) =
                    capture_loop(&thread_path, width, height, &thread_running, &shared)
                {
                    error!(device = %thread_path, error = %e, "V4L2 capture stopped");
                    *lock(&shared.failure) = Some(e);
                }
            })
            .map_err(|e| error!(error = %e, "Failed to spawn capture thread"))
            .ok();

        Self {
            device_path,
            running,
            handle,
        }
    }

    /// Whether the thread is still streaming
    fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop without waiting for the thread on the caller's stack
    fn stop_in_background(self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = std::thread::Builder::new()
            .name("v4l2-reaper".into())
            .spawn(move || drop(self))
        {
            warn!(error = %e, "Failed to spawn reaper thread");
        }
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            // The loop checks `running` after every dequeued buffer
            let _ = handle.join();
        }
        debug!(device = %self.device_path, "Capture thread stopped");
    }
}

/// Device node serving each facing, resolved once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FacingDevices {
    back: Option<String>,
    front: Option<String>,
}

impl FacingDevices {
    /// Configured paths win; otherwise the first node is the back camera and
    /// the second the front. A single camera serves both facings.
    fn resolve(config: &Config, cameras: &[CameraInfo]) -> Self {
        let pick = |facing: Facing, index: usize| {
            config
                .device_for_facing(facing)
                .map(str::to_string)
                .or_else(|| {
                    cameras
                        .get(index.min(cameras.len().saturating_sub(1)))
                        .map(|cam| cam.path.clone())
                })
        };
        Self {
            back: pick(Facing::Back, 0),
            front: pick(Facing::Front, 1),
        }
    }

    fn get(&self, facing: Facing) -> Option<&str> {
        match facing {
            Facing::Back => self.back.as_deref(),
            Facing::Front => self.front.as_deref(),
        }
    }
}

/// Camera backed by V4L2 device nodes
pub struct V4l2Camera {
    devices: FacingDevices,
    width: u32,
    height: u32,
    flash_settle: Duration,
    flash: FlashHardware,
    shared: Arc<SharedFrame>,
    stream: Mutex<Option<CaptureThread>>,
    preview: Mutex<PreviewConfig>,
}

impl V4l2Camera {
    pub fn new(config: &Config) -> Self {
        let fully_configured = config.front_device.is_some() && config.back_device.is_some();
        let cameras = if fully_configured {
            Vec::new()
        } else {
            enumerate_cameras()
        };
        let devices = FacingDevices::resolve(config, &cameras);
        info!(back = ?devices.back, front = ?devices.front, "V4L2 camera mapping");
        Self {
            devices,
            width: config.preview_width,
            height: config.preview_height,
            flash_settle: Duration::from_millis(config.flash_settle_ms),
            flash: FlashHardware::detect(),
            shared: Arc::new(SharedFrame::default()),
            stream: Mutex::new(None),
            preview: Mutex::new(PreviewConfig::default()),
        }
    }

    /// Device node for the requested facing
    pub fn device_for(&self, facing: Facing) -> Option<String> {
        self.devices.get(facing).map(str::to_string)
    }

    /// Make sure a live capture thread streams from the node for `facing`
    ///
    /// A thread that died (device busy, unplugged) is replaced, so a retry
    /// after the cause went away succeeds.
    fn ensure_stream(&self, facing: Facing) -> BackendResult<()> {
        let device_path = self
            .device_for(facing)
            .ok_or_else(|| BackendError::DeviceNotFound(format!("no {} camera", facing)))?;

        let mut stream = lock(&self.stream);
        let failed = lock(&self.shared.failure).is_some();
        if let Some(current) = stream.as_ref()
            && current.device_path == device_path
            && current.is_alive()
            && !failed
        {
            return Ok(());
        }

        if let Some(old) = stream.take() {
            if old.device_path == device_path {
                info!(device = %device_path, "Restarting camera stream");
            }
            old.stop_in_background();
        }
        info!(device = %device_path, %facing, "Opening camera stream");
        self.shared.reset();
        *stream = Some(CaptureThread::spawn(
            device_path,
            self.width,
            self.height,
            Arc::clone(&self.shared),
        ));
        Ok(())
    }

    /// Wait for a frame produced at or after `not_before`
    async fn wait_for_frame(&self, not_before: Instant) -> BackendResult<CameraFrame> {
        let deadline = Instant::now() + timing::FRAME_WAIT;
        loop {
            if let Some(failure) = lock(&self.shared.failure).clone() {
                return Err(failure);
            }
            if let Some(frame) = lock(&self.shared.latest).as_ref()
                && frame.captured_at >= not_before
            {
                return Ok(frame.clone());
            }
            if Instant::now() >= deadline {
                return Err(BackendError::Busy(format!(
                    "no frame within {} ms",
                    timing::FRAME_WAIT.as_millis()
                )));
            }
            tokio::time::sleep(timing::FRAME_POLL).await;
        }
    }
}

#[async_trait]
impl CameraDevice for V4l2Camera {
    fn configure(&self, config: PreviewConfig) -> BackendResult<()> {
        *lock(&self.preview) = config;
        self.ensure_stream(config.facing)
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        lock(&self.shared.latest).clone()
    }

    async fn capture_still(&self, quality: CaptureQuality) -> BackendResult<ImageHandle> {
        let config = *lock(&self.preview);
        self.ensure_stream(config.facing)?;

        info!(facing = %config.facing, flash = %config.flash, "Capturing still from V4L2");

        let use_flash = config.flash.is_on() && self.flash.has_devices();
        if config.flash.is_on() && !use_flash {
            debug!("Flash requested but no controllable flash LED");
        }
        if use_flash {
            self.flash.all_on();
            tokio::time::sleep(self.flash_settle).await;
        }

        let result = self.wait_for_frame(Instant::now()).await;

        if use_flash {
            self.flash.all_off();
        }

        let frame = result?;
        debug!(width = frame.width, height = frame.height, "Frame captured");

        tokio::task::spawn_blocking(move || ImageHandle::encode(frame, config.facing, quality))
            .await
            .map_err(|e| BackendError::CaptureFailed(format!("Encoding task error: {}", e)))?
    }

    fn shutdown(&self) {
        drop(lock(&self.stream).take());
        if self.flash.has_devices() {
            self.flash.all_off();
        }
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// List V4L2 nodes that can capture video
pub fn enumerate_cameras() -> Vec<CameraInfo> {
    let mut cameras: Vec<CameraInfo> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let path = node.path().to_string_lossy().to_string();
            let dev = Device::with_path(&path).ok()?;
            let caps = dev.query_caps().ok()?;
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                return None;
            }
            // UVC exposes a metadata node next to each capture node; it has no formats
            if dev.enum_formats().map(|f| f.is_empty()).unwrap_or(true) {
                return None;
            }
            Some(CameraInfo {
                index: node.index(),
                name: node.name().unwrap_or(caps.card),
                path,
            })
        })
        .collect();
    cameras.sort_by_key(|cam| cam.index);
    cameras
}

/// Negotiate MJPEG, falling back to YUYV
fn negotiate_format(dev: &Device, width: u32, height: u32) -> BackendResult<(RawFormat, u32, u32, u32)> {
    let mut last = None;
    for wanted in [RawFormat::Mjpeg, RawFormat::Yuyv] {
        let mut format = dev.format()?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(&wanted.fourcc());

        match dev.set_format(&format) {
            Ok(applied) => {
                if let Some(raw) = RawFormat::from_fourcc(applied.fourcc.repr) {
                    info!(
                        width = applied.width,
                        height = applied.height,
                        fourcc = %applied.fourcc,
                        "Negotiated V4L2 format"
                    );
                    return Ok((raw, applied.width, applied.height, applied.stride));
                }
                last = Some(applied.fourcc.to_string());
            }
            Err(e) => {
                warn!(fourcc = ?wanted, error = %e, "Format rejected");
            }
        }
    }
    Err(BackendError::NotAvailable(format!(
        "device offers neither MJPEG nor YUYV (got {})",
        last.unwrap_or_else(|| "nothing".into())
    )))
}

/// Capture loop body, runs on the capture thread
fn capture_loop(
    device_path: &str,
    width: u32,
    height: u32,
    running: &AtomicBool,
    shared: &SharedFrame,
) -> BackendResult<()> {
    let mut dev = Device::with_path(device_path).map_err(|e| match e.raw_os_error() {
        Some(libc::EBUSY) => BackendError::Busy(format!("{} is in use", device_path)),
        Some(libc::ENOENT) => BackendError::DeviceNotFound(device_path.to_string()),
        _ => BackendError::NotAvailable(format!("cannot open {}: {}", device_path, e)),
    })?;

    let (raw, width, height, stride) = negotiate_format(&dev, width, height)?;

    let mut stream = MmapStream::with_buffers(&mut dev, Type::VideoCapture, preview::V4L2_BUFFER_COUNT)
        .map_err(|e| BackendError::Busy(format!("cannot start stream: {}", e)))?;
    // Bounded dequeue so a stalled device cannot keep the thread from stopping
    stream.set_timeout(timing::FRAME_WAIT);

    info!(device = device_path, "V4L2 capture stream started");

    let mut consecutive_errors = 0;
    while running.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, meta)) => {
                consecutive_errors = 0;
                let used = (meta.bytesused as usize).min(buf.len());
                let used = if used == 0 { buf.len() } else { used };
                if let Some(frame) = decode_buffer(raw, width, height, stride, &buf[..used]) {
                    *lock(&shared.latest) = Some(frame);
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    return Err(BackendError::Busy(format!("stream failed: {}", e)));
                }
                warn!(error = %e, "Failed to dequeue frame");
                std::thread::sleep(timing::FRAME_POLL);
            }
        }
    }

    info!(device = device_path, "V4L2 capture loop ended");
    Ok(())
}
