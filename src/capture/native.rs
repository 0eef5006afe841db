//! Hardware camera backed by `nokhwa`.
//!
//! `nokhwa` device handles are not `Send`, so the device is created, read
//! and dropped on a dedicated reader thread; decoded frames cross over a
//! bounded channel.

use super::{AuthorizationStatus, Camera, CameraError, CaptureConfig, FrameBuffer, PixelFormat};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

type FrameResult = Result<FrameBuffer, CameraError>;

/// A physical camera.
#[derive(Default)]
pub struct NativeCamera {
    frames: Option<Receiver<FrameResult>>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl NativeCamera {
    /// Creates a closed camera; the device is opened on `open`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Camera for NativeCamera {
    fn is_available(&self) -> bool {
        nokhwa::query(ApiBackend::Auto)
            .map(|devices| !devices.is_empty())
            .unwrap_or(false)
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        if nokhwa::nokhwa_check() {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::NotDetermined
        }
    }

    fn request_access(&mut self) -> AuthorizationStatus {
        if nokhwa::nokhwa_check() {
            return AuthorizationStatus::Authorized;
        }

        let (tx, rx) = mpsc::channel();
        nokhwa::nokhwa_initialize(move |granted| {
            let _ = tx.send(granted);
        });

        match rx.recv() {
            Ok(true) => AuthorizationStatus::Authorized,
            _ => AuthorizationStatus::Denied,
        }
    }

    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.close();

        let (tx, rx) = mpsc::sync_channel(1);
        let (ready_tx, ready_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = Arc::clone(&stop);
        let reader_config = config.clone();

        let reader = std::thread::Builder::new()
            .name("camera-reader".into())
            .spawn(move || read_frames(reader_config, tx, ready_tx, reader_stop))
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = reader.join();
                return Err(e);
            }
            Err(_) => return Err(CameraError::OpenFailed("camera reader exited".into())),
        }

        self.frames = Some(rx);
        self.stop = stop;
        self.reader = Some(reader);
        tracing::info!(device = config.device_id, "Native camera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<FrameBuffer, CameraError> {
        let frames = self.frames.as_ref().ok_or(CameraError::NotInitialized)?;
        frames
            .recv()
            .map_err(|_| CameraError::CaptureFailed("camera reader stopped".into()))?
    }

    fn is_open(&self) -> bool {
        self.frames.is_some()
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Release);
        // Dropping the receiver unblocks a reader waiting to hand off a frame.
        self.frames = None;
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
            tracing::info!("Native camera closed");
        }
    }
}

impl Drop for NativeCamera {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_frames(
    config: CaptureConfig,
    tx: SyncSender<FrameResult>,
    ready: mpsc::Sender<Result<(), CameraError>>,
    stop: Arc<AtomicBool>,
) {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        ),
    ));

    let mut device = match nokhwa::Camera::new(CameraIndex::Index(config.device_id), format) {
        Ok(device) => device,
        Err(e) => {
            let _ = ready.send(Err(CameraError::DeviceNotFound(e.to_string())));
            return;
        }
    };
    if let Err(e) = device.open_stream() {
        let _ = ready.send(Err(CameraError::OpenFailed(e.to_string())));
        return;
    }
    let _ = ready.send(Ok(()));

    let mut sequence = 0u64;
    while !stop.load(Ordering::Acquire) {
        let result = device
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>())
            .map(|image| {
                sequence += 1;
                let (width, height) = (image.width(), image.height());
                FrameBuffer::new(image.into_raw(), width, height, PixelFormat::Rgb8, sequence)
            })
            .map_err(|e| CameraError::CaptureFailed(e.to_string()));

        if tx.send(result).is_err() {
            break;
        }
    }

    let _ = device.stop_stream();
}
