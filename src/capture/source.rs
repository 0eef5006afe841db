//! Camera session lifecycle and frame delivery.
//!
//! The frame source owns the camera and a single producer thread. Frames
//! are handed to one consumer callback, sequentially and never overlapping.
//! The most recent frame is retained for on-demand still capture.

use super::{
    AuthorizationStatus, Camera, CaptureConfig, FrameBuffer, StillImage, SyntheticCamera,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Back-off after a failed frame read.
const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Outcome of starting the frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Not started yet, or stopped.
    Idle,
    /// Delivering frames from the camera.
    Live,
    /// No usable hardware; delivering the synthetic placeholder feed.
    Placeholder,
    /// Access denied. The user must change it in system settings.
    PermissionDenied,
}

/// Anything that can render the most recent frame to a still image.
pub trait StillSource {
    /// Returns `None` when no frame has been delivered yet.
    fn capture_current_image(&self) -> Option<StillImage>;
}

/// Shared slot holding the most recently delivered frame.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Option<Arc<FrameBuffer>>>>,
    mirror: bool,
}

impl LatestFrame {
    /// Creates an empty slot. `mirror` controls still orientation.
    pub fn new(mirror: bool) -> Self {
        Self {
            slot: Arc::default(),
            mirror,
        }
    }

    /// Replaces the retained frame.
    pub fn store(&self, frame: Arc<FrameBuffer>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(frame);
        }
    }

    /// Returns the retained frame, if any.
    pub fn get(&self) -> Option<Arc<FrameBuffer>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl StillSource for LatestFrame {
    fn capture_current_image(&self) -> Option<StillImage> {
        self.get()
            .and_then(|frame| StillImage::from_frame(&frame, self.mirror))
    }
}

/// Owns the camera session and its producer thread.
pub struct FrameSource {
    /// Parked here while stopped; moved onto the producer thread while running.
    camera: Option<Box<dyn Camera>>,
    config: CaptureConfig,
    running: Arc<AtomicBool>,
    producer: Option<JoinHandle<Box<dyn Camera>>>,
    /// Producer that was stopped from its own thread and still owes the camera.
    exiting: Option<JoinHandle<Box<dyn Camera>>>,
    latest: LatestFrame,
    frames_delivered: Arc<AtomicU64>,
    status: SourceStatus,
    placeholder: bool,
}

impl FrameSource {
    /// Creates a stopped frame source around `camera`.
    pub fn new(camera: Box<dyn Camera>, config: CaptureConfig) -> Self {
        let latest = LatestFrame::new(config.mirror_stills);
        Self {
            camera: Some(camera),
            config,
            running: Arc::new(AtomicBool::new(false)),
            producer: None,
            exiting: None,
            latest,
            frames_delivered: Arc::new(AtomicU64::new(0)),
            status: SourceStatus::Idle,
            placeholder: false,
        }
    }

    /// Starts delivering frames to `consumer` on the producer thread.
    ///
    /// Idempotent while running. Permission is re-checked on every start;
    /// an undetermined permission blocks here until the user answers.
    pub fn start<F>(&mut self, mut consumer: F) -> SourceStatus
    where
        F: FnMut(&Arc<FrameBuffer>) + Send + 'static,
    {
        if self.producer.is_some() {
            return self.status;
        }

        if let Some(handle) = self.exiting.take() {
            if handle.thread().id() == std::thread::current().id() {
                tracing::debug!("Restart requested from the exiting producer thread");
                self.exiting = Some(handle);
                return self.status;
            }
            self.reclaim(handle);
        }

        let Some(mut camera) = self.camera.take() else {
            tracing::warn!("Frame source has no camera to start");
            return self.status;
        };

        if !self.placeholder && !camera.is_available() {
            tracing::warn!("No capture hardware, switching to placeholder feed for this session");
            camera = Box::new(SyntheticCamera::new());
            self.placeholder = true;
        }

        if !self.placeholder {
            let mut authorization = camera.authorization_status();
            if authorization == AuthorizationStatus::NotDetermined {
                tracing::info!("Requesting camera permission");
                authorization = camera.request_access();
            }
            if authorization != AuthorizationStatus::Authorized {
                tracing::warn!("Camera permission denied");
                self.camera = Some(camera);
                self.status = SourceStatus::PermissionDenied;
                return self.status;
            }
        }

        if let Err(e) = camera.open(&self.config) {
            tracing::warn!(error = %e, "Camera failed to open, switching to placeholder feed");
            camera = Box::new(SyntheticCamera::new());
            self.placeholder = true;
            if let Err(e) = camera.open(&self.config) {
                tracing::warn!(error = %e, "Placeholder feed failed to open");
                self.camera = Some(camera);
                self.status = SourceStatus::Idle;
                return self.status;
            }
        }

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let latest = self.latest.clone();
        let delivered = Arc::clone(&self.frames_delivered);

        let spawned = std::thread::Builder::new()
            .name("frame-producer".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    match camera.capture() {
                        Ok(frame) => {
                            let frame = Arc::new(frame);
                            latest.store(Arc::clone(&frame));
                            delivered.fetch_add(1, Ordering::Relaxed);
                            consumer(&frame);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Frame read failed");
                            std::thread::sleep(CAPTURE_RETRY_DELAY);
                        }
                    }
                }
                camera.close();
                camera
            });

        match spawned {
            Ok(handle) => {
                self.producer = Some(handle);
                self.status = if self.placeholder {
                    SourceStatus::Placeholder
                } else {
                    SourceStatus::Live
                };
                tracing::info!(status = ?self.status, "Frame source started");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to spawn producer thread");
                self.running.store(false, Ordering::Release);
                self.status = SourceStatus::Idle;
            }
        }
        self.status
    }

    /// Stops frame delivery.
    ///
    /// Safe to call repeatedly and from teardown paths. The retained frame
    /// survives so stills and overlays stay valid until replaced.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(handle) = self.producer.take() else {
            return;
        };

        if handle.thread().id() == std::thread::current().id() {
            // Called from inside the consumer; the loop exits on its own and
            // the camera is collected on the next start.
            tracing::debug!("Frame source stop requested from producer thread");
            self.exiting = Some(handle);
        } else {
            self.reclaim(handle);
        }
        self.status = SourceStatus::Idle;
        tracing::info!("Frame source stopped");
    }

    /// Joins a finished producer and parks its camera for the next start.
    fn reclaim(&mut self, handle: JoinHandle<Box<dyn Camera>>) {
        match handle.join() {
            Ok(camera) => self.camera = Some(camera),
            Err(_) => {
                tracing::warn!("Producer thread panicked; camera replaced by placeholder");
                self.camera = Some(Box::new(SyntheticCamera::new()));
                self.placeholder = true;
            }
        }
    }

    /// Returns true while the producer thread is delivering frames.
    pub fn is_running(&self) -> bool {
        self.producer.is_some()
    }

    /// Last status reported by `start` or `stop`.
    pub fn status(&self) -> SourceStatus {
        self.status
    }

    /// False once the session fell back to the placeholder feed.
    pub fn is_available(&self) -> bool {
        !self.placeholder
    }

    /// False after the most recent start found permission denied.
    pub fn permission_granted(&self) -> bool {
        self.status != SourceStatus::PermissionDenied
    }

    /// Total frames delivered since construction.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    /// Handle to the retained-frame slot.
    pub fn latest(&self) -> &LatestFrame {
        &self.latest
    }
}

impl StillSource for FrameSource {
    fn capture_current_image(&self) -> Option<StillImage> {
        self.latest.capture_current_image()
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
