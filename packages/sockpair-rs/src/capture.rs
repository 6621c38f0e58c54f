//! Live camera capture: acquiring a stream, binding it to a preview,
//! grabbing stills and releasing the device.
//!
//! The manager moves through `Idle -> Requesting -> Live -> Stopped`, with
//! `Denied` reachable from `Requesting`. Whatever path is taken out of it,
//! every acquired track is stopped exactly once.
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use image::{imageops, ImageFormat, RgbImage};
use log::{debug, info, warn};
use sockpair_vision::ImageData;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    Environment,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub video: bool,
    pub audio: bool,
}

impl CameraConstraints {
    /// Rear-facing, video only.
    pub fn rear_video() -> Self {
        Self {
            facing: FacingMode::Environment,
            video: true,
            audio: false,
        }
    }
}

/// Why a camera could not be acquired. The `Display` text is the message
/// shown in place of the preview.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Camera access was denied. Allow camera access or upload a photo instead.")]
    PermissionDenied,
    #[error("No camera was found on this device.")]
    NotFound,
    /// Carries the backend's detail for the logs; the user sees a fixed message.
    #[error("The camera could not be started.")]
    Other(String),
}

impl DeviceError {
    /// Maps media error names (`NotAllowedError`, `NotFoundError`, ...) to a
    /// device error.
    pub fn from_error_name(name: &str, detail: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                DeviceError::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                DeviceError::NotFound
            }
            _ => DeviceError::Other(detail.to_string()),
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("camera is not live")]
    NotLive,
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
}

pub trait MediaTrack: Send + Sync {
    fn stop(&self);
    fn is_live(&self) -> bool;
}

pub trait MediaStream: Send + Sync {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;
    /// Width and height the device delivers; `(0, 0)` until frames flow.
    fn native_resolution(&self) -> (u32, u32);
    fn grab_frame(&self) -> Option<RgbImage>;
}

#[async_trait]
pub trait CameraBackend: Send + Sync {
    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn MediaStream>, DeviceError>;
}

/// A view showing the live stream. Unbinding drops the view's reference but
/// never stops the stream; only the manager does that.
pub trait PreviewSurface: Send {
    fn bind(&mut self, stream: Arc<dyn MediaStream>);
    fn unbind(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Requesting,
    Live,
    Denied(DeviceError),
    Stopped,
}

struct Inner {
    state: CaptureState,
    stream: Option<Arc<dyn MediaStream>>,
    preview: Box<dyn PreviewSurface>,
}

impl Inner {
    /// Unbinds the preview and stops the held stream, if any. Safe to repeat.
    fn release(&mut self) -> bool {
        let Some(stream) = self.stream.take() else {
            return false;
        };
        self.preview.unbind();
        stop_tracks(stream.as_ref());
        true
    }
}

fn stop_tracks(stream: &dyn MediaStream) {
    let tracks = stream.tracks();
    for track in &tracks {
        track.stop();
    }
    debug!("stopped {} media track(s)", tracks.len());
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Puts a manager left in `Requesting` back to `Idle` when an `open` future
/// is dropped before the backend answers.
struct PendingAcquire<'a> {
    inner: &'a Mutex<Inner>,
    settled: bool,
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.state == CaptureState::Requesting {
            debug!("camera request abandoned before it resolved");
            inner.state = CaptureState::Idle;
        }
    }
}

/// Owns one camera stream from acquisition to release.
pub struct CaptureDeviceManager {
    backend: Arc<dyn CameraBackend>,
    constraints: CameraConstraints,
    inner: Mutex<Inner>,
}

impl CaptureDeviceManager {
    pub fn new(backend: Arc<dyn CameraBackend>, preview: Box<dyn PreviewSurface>) -> Self {
        Self {
            backend,
            constraints: CameraConstraints::rear_video(),
            inner: Mutex::new(Inner {
                state: CaptureState::Idle,
                stream: None,
                preview,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lock().state == CaptureState::Live
    }

    /// User-facing message while in the `Denied` state.
    pub fn error_message(&self) -> Option<String> {
        match &self.lock().state {
            CaptureState::Denied(e) => Some(e.user_message()),
            _ => None,
        }
    }

    /// Requests the camera and binds it to the preview once it arrives.
    ///
    /// Only an `Idle` manager issues a request. If the manager is stopped
    /// while the request is pending, the stream is released as soon as it
    /// resolves and the preview is never bound.
    pub async fn open(&self) -> CaptureState {
        {
            let mut inner = self.lock();
            if inner.state != CaptureState::Idle {
                return inner.state.clone();
            }
            inner.state = CaptureState::Requesting;
        }
        info!("requesting camera ({:?} facing)", self.constraints.facing);
        let mut pending = PendingAcquire {
            inner: &self.inner,
            settled: false,
        };

        let acquired = self.backend.acquire(&self.constraints).await;
        pending.settled = true;

        let mut inner = self.lock();
        match acquired {
            Ok(stream) if inner.state == CaptureState::Requesting => {
                inner.preview.bind(stream.clone());
                inner.stream = Some(stream);
                inner.state = CaptureState::Live;
                info!("camera live");
            }
            Ok(stream) => {
                info!("camera closed before acquisition finished, releasing stream");
                stop_tracks(stream.as_ref());
            }
            Err(e) if inner.state == CaptureState::Requesting => {
                warn!("camera unavailable: {:?}", e);
                inner.state = CaptureState::Denied(e);
            }
            Err(e) => {
                debug!("camera request failed after close: {}", e);
            }
        }
        inner.state.clone()
    }

    /// Grabs the current frame at the stream's native resolution and encodes
    /// it as JPEG. `Ok(None)` means no frame is available yet.
    pub fn capture_photo(&self) -> Result<Option<ImageData>, CaptureError> {
        let stream = {
            let inner = self.lock();
            match (&inner.state, &inner.stream) {
                (CaptureState::Live, Some(stream)) => stream.clone(),
                _ => return Err(CaptureError::NotLive),
            }
        };

        let (width, height) = stream.native_resolution();
        if width == 0 || height == 0 {
            return Ok(None);
        }
        let Some(frame) = stream.grab_frame() else {
            return Ok(None);
        };
        let frame = if frame.dimensions() == (width, height) {
            frame
        } else {
            imageops::resize(&frame, width, height, imageops::FilterType::Triangle)
        };

        let mut encoded = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        debug!("captured {}x{} snapshot ({} bytes)", width, height, encoded.len());
        Ok(Some(ImageData::from_bytes("image/jpeg", &encoded)))
    }

    /// Releases the camera. Calling it again is a no-op.
    pub fn stop_camera(&self) {
        let mut inner = self.lock();
        if inner.state == CaptureState::Stopped {
            return;
        }
        if inner.release() {
            info!("camera released");
        }
        inner.state = CaptureState::Stopped;
    }
}

impl Drop for CaptureDeviceManager {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.release() {
            info!("camera released on teardown");
        }
        inner.state = CaptureState::Stopped;
    }
}

/// Track of a [`FrameStream`]; counts stop requests so release can be audited.
pub struct SourceTrack {
    live: AtomicBool,
    stop_calls: AtomicUsize,
}

impl SourceTrack {
    fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl MediaTrack for SourceTrack {
    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// A stream that keeps serving the same frame while its track is live.
pub struct FrameStream {
    frame: RgbImage,
    track: Arc<SourceTrack>,
}

impl FrameStream {
    pub fn track(&self) -> &Arc<SourceTrack> {
        &self.track
    }
}

impl MediaStream for FrameStream {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![self.track.clone() as Arc<dyn MediaTrack>]
    }

    fn native_resolution(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn grab_frame(&self) -> Option<RgbImage> {
        self.track.is_live().then(|| self.frame.clone())
    }
}

/// In-process camera backed by a still frame, or by a scripted failure.
pub struct FrameSourceCamera {
    outcome: Result<RgbImage, DeviceError>,
    issued: Mutex<Vec<Arc<FrameStream>>>,
}

impl FrameSourceCamera {
    pub fn new(frame: RgbImage) -> Self {
        Self {
            outcome: Ok(frame),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: DeviceError) -> Self {
        Self {
            outcome: Err(error),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn from_image_file<P: AsRef<std::path::Path>>(path: P) -> image::ImageResult<Self> {
        Ok(Self::new(image::open(path)?.to_rgb8()))
    }

    /// Streams handed out so far, oldest first.
    pub fn issued_streams(&self) -> Vec<Arc<FrameStream>> {
        self.issued
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CameraBackend for FrameSourceCamera {
    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn MediaStream>, DeviceError> {
        if !constraints.video {
            return Err(DeviceError::Other("video track required".into()));
        }
        let frame = self.outcome.clone()?;
        let stream = Arc::new(FrameStream {
            frame,
            track: Arc::new(SourceTrack::new()),
        });
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(stream.clone());
        }
        Ok(stream)
    }
}

#[derive(Default)]
struct PreviewRecord {
    bound: Option<Arc<dyn MediaStream>>,
    bind_calls: usize,
    unbind_calls: usize,
}

/// Preview without a display; clones share state so the binding can be
/// inspected after the manager takes ownership.
#[derive(Clone, Default)]
pub struct HeadlessPreview {
    record: Arc<Mutex<PreviewRecord>>,
}

impl HeadlessPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.record.lock().map(|r| r.bound.is_some()).unwrap_or(false)
    }

    pub fn bind_calls(&self) -> usize {
        self.record.lock().map(|r| r.bind_calls).unwrap_or(0)
    }

    pub fn unbind_calls(&self) -> usize {
        self.record.lock().map(|r| r.unbind_calls).unwrap_or(0)
    }
}

impl PreviewSurface for HeadlessPreview {
    fn bind(&mut self, stream: Arc<dyn MediaStream>) {
        if let Ok(mut record) = self.record.lock() {
            record.bound = Some(stream);
            record.bind_calls += 1;
        }
    }

    fn unbind(&mut self) {
        if let Ok(mut record) = self.record.lock() {
            record.bound = None;
            record.unbind_calls += 1;
        }
    }
}
