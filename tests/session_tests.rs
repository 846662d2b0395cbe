// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture session

use async_trait::async_trait;
use snapcam::backends::camera::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame, CaptureQuality,
    Facing, ImageHandle, PreviewConfig, SyntheticCamera,
};
use snapcam::errors::{PersistError, SessionError, TransitionError};
use snapcam::flash::FlashMode;
use snapcam::media::{MediaStore, PhotoLibrary, SavedPhoto};
use snapcam::permissions::{FixedPermissionGateway, PermissionGateway, PermissionStatus};
use snapcam::session::{Action, CaptureSessionController, NoticeKind, SessionPhase, SessionView};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Synthetic camera that counts calls and can be told to fail
struct RecordingCamera {
    inner: SyntheticCamera,
    captures: AtomicUsize,
    fail_capture: AtomicBool,
    configs: Mutex<Vec<PreviewConfig>>,
    qualities: Mutex<Vec<CaptureQuality>>,
}

impl RecordingCamera {
    fn new() -> Self {
        Self {
            inner: SyntheticCamera::with_size(32, 24),
            captures: AtomicUsize::new(0),
            fail_capture: AtomicBool::new(false),
            configs: Mutex::new(Vec::new()),
            qualities: Mutex::new(Vec::new()),
        }
    }

    fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    fn last_config(&self) -> Option<PreviewConfig> {
        self.configs.lock().unwrap().last().copied()
    }

    fn last_quality(&self) -> Option<CaptureQuality> {
        self.qualities.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl CameraDevice for RecordingCamera {
    fn configure(&self, config: PreviewConfig) -> BackendResult<()> {
        self.configs.lock().unwrap().push(config);
        self.inner.configure(config)
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.inner.latest_frame()
    }

    async fn capture_still(&self, quality: CaptureQuality) -> BackendResult<ImageHandle> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        self.qualities.lock().unwrap().push(quality);
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(BackendError::Busy("device in use".into()));
        }
        self.inner.capture_still(quality).await
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Synthetic
    }
}

/// Media store that records persisted ids and can be told to fail
#[derive(Default)]
struct RecordingStore {
    persisted: Mutex<Vec<uuid::Uuid>>,
    fail: AtomicBool,
}

impl RecordingStore {
    fn persisted(&self) -> Vec<uuid::Uuid> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for RecordingStore {
    async fn persist(&self, image: &ImageHandle) -> Result<SavedPhoto, PersistError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistError::Io("disk full".into()));
        }
        self.persisted.lock().unwrap().push(image.id());
        Ok(SavedPhoto {
            image_id: image.id(),
            path: format!("/virtual/{}.jpg", image.id()).into(),
        })
    }
}

struct Harness {
    session: CaptureSessionController,
    camera: Arc<RecordingCamera>,
    store: Arc<RecordingStore>,
}

fn harness(camera: PermissionStatus, media: PermissionStatus) -> Harness {
    let camera_device = Arc::new(RecordingCamera::new());
    let store = Arc::new(RecordingStore::default());
    let session = CaptureSessionController::new(
        Arc::new(FixedPermissionGateway { camera, media }),
        camera_device.clone(),
        store.clone(),
    );
    Harness {
        session,
        camera: camera_device,
        store,
    }
}

async fn live() -> Harness {
    let mut h = harness(PermissionStatus::Granted, PermissionStatus::Granted);
    assert_eq!(h.session.initialize().await, Ok(SessionPhase::LivePreview));
    h
}

#[tokio::test]
async fn test_capture_then_save() {
    let mut h = live().await;
    assert_eq!(
        h.session.view(),
        SessionView::LivePreview {
            facing: Facing::Back,
            flash: FlashMode::Off,
            can_save: true,
        }
    );

    let image = h.session.capture().await.unwrap();
    assert_eq!(h.camera.last_quality(), Some(CaptureQuality::MAX));
    assert_eq!(h.session.phase(), SessionPhase::CapturedPreview);
    assert_eq!(
        h.session.view(),
        SessionView::CapturedPreview {
            image: image.clone(),
            can_save: true,
        }
    );

    h.session.save().await.unwrap();
    assert_eq!(h.store.persisted(), vec![image.id()]);
    assert_eq!(h.session.phase(), SessionPhase::LivePreview);
    assert!(h.session.state().captured_image().is_none());
    assert_eq!(h.session.state().facing(), Facing::Back);
    assert_eq!(h.session.state().flash(), FlashMode::Off);

    let notice = h.session.take_notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(notice.title, "Saved!");
}

#[tokio::test]
async fn test_configured_quality_reaches_the_camera() {
    let camera_device = Arc::new(RecordingCamera::new());
    let mut session = CaptureSessionController::new(
        Arc::new(FixedPermissionGateway {
            camera: PermissionStatus::Granted,
            media: PermissionStatus::Granted,
        }),
        camera_device.clone(),
        Arc::new(RecordingStore::default()),
    )
    .with_quality(CaptureQuality::new(0.5));
    session.initialize().await.unwrap();

    let image = session.capture().await.unwrap();
    assert_eq!(camera_device.last_quality(), Some(CaptureQuality::new(0.5)));
    assert_eq!(image.quality(), CaptureQuality::new(0.5));
}

#[tokio::test]
async fn test_retake_discards_without_saving() {
    let mut h = live().await;
    h.session.capture().await.unwrap();
    h.session.retake().unwrap();

    assert_eq!(h.session.phase(), SessionPhase::LivePreview);
    assert!(h.store.persisted().is_empty());
    assert!(h.session.notice().is_none());
}

#[tokio::test]
async fn test_retake_without_image_changes_nothing() {
    let mut h = live().await;
    let before = h.session.state().clone();
    assert_eq!(
        h.session.retake(),
        Err(SessionError::InvalidTransition(
            TransitionError::NoCapturedImage {
                action: Action::Retake
            }
        ))
    );
    assert_eq!(h.session.state(), &before);
}

#[tokio::test]
async fn test_camera_denied_blocks_session() {
    let mut h = harness(PermissionStatus::Denied, PermissionStatus::Granted);
    assert_eq!(
        h.session.initialize().await,
        Err(SessionError::PermissionDenied {
            camera: PermissionStatus::Denied,
            media: PermissionStatus::Granted,
        })
    );
    assert_eq!(h.session.phase(), SessionPhase::Blocked);
    assert!(matches!(h.session.view(), SessionView::Blocked { .. }));
    assert!(h.session.available_actions().is_empty());

    assert!(h.session.capture().await.is_err());
    assert!(h.session.toggle_facing().is_err());
    assert_eq!(h.camera.captures(), 0);
    assert!(h.camera.last_config().is_none());
}

#[tokio::test]
async fn test_media_denied_allows_capture_but_not_save() {
    let mut h = harness(PermissionStatus::Granted, PermissionStatus::Denied);
    assert_eq!(h.session.initialize().await, Ok(SessionPhase::LivePreview));

    h.session.capture().await.unwrap();
    assert_eq!(h.session.available_actions(), vec![Action::Retake]);
    assert_eq!(
        h.session.save().await,
        Err(SessionError::InvalidTransition(
            TransitionError::MediaPermissionDenied
        ))
    );
    assert_eq!(h.session.phase(), SessionPhase::CapturedPreview);
    assert!(h.store.persisted().is_empty());
}

#[tokio::test]
async fn test_actions_rejected_before_initialize() {
    let mut h = harness(PermissionStatus::Granted, PermissionStatus::Granted);
    assert_eq!(h.session.view(), SessionView::PermissionPending);
    assert_eq!(
        h.session.toggle_flash(),
        Err(SessionError::InvalidTransition(
            TransitionError::PermissionsPending {
                action: Action::ToggleFlash
            }
        ))
    );
    assert!(h.session.capture().await.is_err());
    assert_eq!(h.camera.captures(), 0);
}

#[tokio::test]
async fn test_failed_save_keeps_image_for_retry() {
    let mut h = live().await;
    let image = h.session.capture().await.unwrap();

    h.store.fail.store(true, Ordering::SeqCst);
    let err = h.session.save().await.unwrap_err();
    assert!(matches!(err, SessionError::PersistFailed(_)));
    assert_eq!(h.session.phase(), SessionPhase::CapturedPreview);
    assert_eq!(h.session.state().captured_image(), Some(&image));
    assert_eq!(h.session.take_notice().unwrap().kind, NoticeKind::Error);

    h.store.fail.store(false, Ordering::SeqCst);
    h.session.save().await.unwrap();
    assert_eq!(h.store.persisted(), vec![image.id()]);
}

#[tokio::test]
async fn test_failed_capture_stays_live() {
    let mut h = live().await;
    h.camera.fail_capture.store(true, Ordering::SeqCst);

    let err = h.session.capture().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::CaptureFailed(BackendError::Busy("device in use".into()))
    );
    assert_eq!(h.session.phase(), SessionPhase::LivePreview);
    assert_eq!(h.session.take_notice().unwrap().title, "Capture failed");

    h.camera.fail_capture.store(false, Ordering::SeqCst);
    h.session.capture().await.unwrap();
    assert_eq!(h.session.phase(), SessionPhase::CapturedPreview);
}

#[tokio::test]
async fn test_save_twice_persists_once() {
    let mut h = live().await;
    h.session.capture().await.unwrap();
    h.session.save().await.unwrap();

    assert_eq!(
        h.session.save().await,
        Err(SessionError::InvalidTransition(
            TransitionError::NoCapturedImage {
                action: Action::Save
            }
        ))
    );
    assert_eq!(h.store.persisted().len(), 1);
}

#[tokio::test]
async fn test_toggles_reach_the_camera() {
    let mut h = live().await;
    assert_eq!(h.session.toggle_facing(), Ok(Facing::Front));
    assert_eq!(h.session.toggle_flash(), Ok(FlashMode::On));
    assert_eq!(
        h.camera.last_config(),
        Some(PreviewConfig {
            facing: Facing::Front,
            flash: FlashMode::On,
        })
    );

    let image = h.session.capture().await.unwrap();
    assert_eq!(image.facing(), Facing::Front);

    // Settings are locked while reviewing
    assert!(h.session.toggle_facing().is_err());
    h.session.retake().unwrap();

    assert_eq!(h.session.toggle_facing(), Ok(Facing::Back));
    assert_eq!(h.session.toggle_flash(), Ok(FlashMode::Off));
}

#[tokio::test]
async fn test_new_session_starts_from_defaults() {
    let mut h = live().await;
    h.session.toggle_facing().unwrap();
    h.session.toggle_flash().unwrap();
    drop(h);

    let h = live().await;
    assert_eq!(h.session.state().facing(), Facing::Back);
    assert_eq!(h.session.state().flash(), FlashMode::Off);
}

/// Gateway whose answers only arrive once both requests are in flight
struct RendezvousGateway {
    barrier: tokio::sync::Barrier,
}

#[async_trait]
impl PermissionGateway for RendezvousGateway {
    async fn request_camera_permission(&self) -> PermissionStatus {
        self.barrier.wait().await;
        PermissionStatus::Granted
    }

    async fn request_media_permission(&self) -> PermissionStatus {
        self.barrier.wait().await;
        PermissionStatus::Granted
    }
}

#[tokio::test]
async fn test_permission_requests_run_concurrently() {
    let mut session = CaptureSessionController::new(
        Arc::new(RendezvousGateway {
            barrier: tokio::sync::Barrier::new(2),
        }),
        Arc::new(SyntheticCamera::with_size(8, 8)),
        Arc::new(RecordingStore::default()),
    );

    let phase = tokio::time::timeout(Duration::from_secs(5), session.initialize())
        .await
        .expect("permission requests were issued one after the other");
    assert_eq!(phase, Ok(SessionPhase::LivePreview));
}

#[tokio::test]
async fn test_saves_real_jpeg_into_library() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = CaptureSessionController::new(
        Arc::new(FixedPermissionGateway::granted()),
        Arc::new(SyntheticCamera::with_size(64, 48)),
        Arc::new(PhotoLibrary::new(dir.path().join("album"))),
    );
    session.initialize().await.unwrap();
    session.capture().await.unwrap();
    let saved = session.save().await.unwrap();

    let decoded = image::open(&saved.path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
    assert!(
        saved
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("IMG_")
    );
}
