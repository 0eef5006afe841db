//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for real camera input, the synthetic placeholder feed, and
//! mock implementations for testing.

use super::{CaptureConfig, FrameBuffer, PixelFormat};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No device matches the requested index.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device exists but could not be opened.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The configuration was rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A frame could not be read.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// Capture was attempted before `open`.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Camera access permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// Access granted.
    Authorized,
    /// The user has not answered the permission prompt yet.
    NotDetermined,
    /// Denied or restricted. Only a change in system settings can fix this.
    Denied,
}

/// Trait for camera implementations.
///
/// Implementations are moved onto the producer thread, hence `Send`.
pub trait Camera: Send {
    /// Returns false when no capture-capable hardware exists.
    fn is_available(&self) -> bool {
        true
    }

    /// Current permission state, without prompting.
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    /// Prompts for access and blocks until the user answers.
    fn request_access(&mut self) -> AuthorizationStatus {
        self.authorization_status()
    }

    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame, blocking until one is available.
    fn capture(&mut self) -> Result<FrameBuffer, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Sleeps just long enough to hold a target frame rate.
#[derive(Debug, Default)]
struct FramePacer {
    interval: Duration,
    last: Option<Instant>,
}

impl FramePacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Deterministic placeholder feed used when no camera hardware exists.
///
/// Produces a looping animated diagonal stripe pattern with a cool tint.
/// Luminance stays mid-range and no pixel approaches white, so the feed is
/// visually distinct from a real scene yet never trips the exposure or
/// glare checks on its own.
#[derive(Debug, Default)]
pub struct SyntheticCamera {
    config: Option<CaptureConfig>,
    pacer: FramePacer,
    sequence: u64,
}

impl SyntheticCamera {
    /// Stripe period in pixels; the animation loops every `PERIOD` frames.
    const PERIOD: u64 = 64;

    /// Creates a closed placeholder feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the placeholder frame for a given sequence number.
    pub fn render(width: u32, height: u32, sequence: u64) -> FrameBuffer {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        let shift = sequence % Self::PERIOD;

        for y in 0..u64::from(height) {
            for x in 0..u64::from(width) {
                let phase = (x + y + shift * 2) % Self::PERIOD;
                let v = 115 + phase as u8; // 115..=178
                pixels.extend_from_slice(&[v - 12, v, v + 12]);
            }
        }

        FrameBuffer::new(pixels, width, height, PixelFormat::Rgb8, sequence)
    }
}

impl Camera for SyntheticCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.pacer = FramePacer::new(config.frame_interval());
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            width = config.width,
            height = config.height,
            "Synthetic placeholder feed opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<FrameBuffer, CameraError> {
        let (width, height) = {
            let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
            (config.width, config.height)
        };
        self.pacer.wait();
        self.sequence += 1;
        Ok(Self::render(width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("Synthetic placeholder feed closed");
    }
}

/// Mock camera for testing that delivers solid-colour frames.
///
/// Hardware availability and permission state are configurable so the
/// frame source's degraded paths can be exercised.
#[derive(Debug)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    pacer: FramePacer,
    sequence: u64,
    rgb: (u8, u8, u8),
    available: bool,
    status: AuthorizationStatus,
    /// Answer given when the permission prompt is shown.
    prompt_answer: AuthorizationStatus,
    prompts_shown: u32,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            config: None,
            pacer: FramePacer::default(),
            sequence: 0,
            rgb: (153, 153, 153),
            available: true,
            status: AuthorizationStatus::Authorized,
            prompt_answer: AuthorizationStatus::Authorized,
            prompts_shown: 0,
        }
    }
}

impl MockCamera {
    /// Creates an available, authorized mock camera.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames are filled with this colour.
    pub fn with_color(mut self, rgb: (u8, u8, u8)) -> Self {
        self.rgb = rgb;
        self
    }

    /// Reports no capture hardware.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Sets the initial permission status and the answer to the prompt.
    pub fn with_authorization(
        mut self,
        status: AuthorizationStatus,
        prompt_answer: AuthorizationStatus,
    ) -> Self {
        self.status = status;
        self.prompt_answer = prompt_answer;
        self
    }

    /// Number of times the permission prompt was shown.
    pub fn prompts_shown(&self) -> u32 {
        self.prompts_shown
    }
}

impl Camera for MockCamera {
    fn is_available(&self) -> bool {
        self.available
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.status
    }

    fn request_access(&mut self) -> AuthorizationStatus {
        if self.status == AuthorizationStatus::NotDetermined {
            self.prompts_shown += 1;
            self.status = self.prompt_answer;
        }
        self.status
    }

    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if !self.available {
            return Err(CameraError::DeviceNotFound(format!(
                "mock device {}",
                config.device_id
            )));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.pacer = FramePacer::new(config.frame_interval());
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!("MockCamera opened with config: {:?}", config);
        Ok(())
    }

    fn capture(&mut self) -> Result<FrameBuffer, CameraError> {
        let (width, height) = {
            let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
            (config.width, config.height)
        };
        self.pacer.wait();
        self.sequence += 1;
        Ok(FrameBuffer::solid(width, height, self.rgb, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CaptureConfig {
        CaptureConfig {
            fps: 120,
            ..CaptureConfig::with_dimensions(32, 24)
        }
    }

    #[test]
    fn test_mock_camera_lifecycle() {
        let mut camera = MockCamera::new();
        assert!(!camera.is_open());

        camera.open(&small_config()).unwrap();
        assert!(camera.is_open());

        let frame = camera.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = camera.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);

        camera.close();
        assert!(!camera.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = MockCamera::new();
        assert!(matches!(
            camera.capture(),
            Err(CameraError::NotInitialized)
        ));
    }

    #[test]
    fn test_permission_prompt_resolves_once() {
        let mut camera = MockCamera::new().with_authorization(
            AuthorizationStatus::NotDetermined,
            AuthorizationStatus::Denied,
        );
        assert_eq!(camera.request_access(), AuthorizationStatus::Denied);
        assert_eq!(camera.request_access(), AuthorizationStatus::Denied);
        assert_eq!(camera.prompts_shown(), 1);
    }

    #[test]
    fn test_synthetic_feed_is_deterministic_and_loops() {
        let a = SyntheticCamera::render(16, 8, 3);
        let b = SyntheticCamera::render(16, 8, 3);
        let looped = SyntheticCamera::render(16, 8, 3 + SyntheticCamera::PERIOD);
        let next = SyntheticCamera::render(16, 8, 4);

        assert!(a.is_valid());
        assert_eq!(a.pixels(), b.pixels());
        assert_eq!(a.pixels(), looped.pixels());
        assert_ne!(a.pixels(), next.pixels());
    }

    #[test]
    fn test_synthetic_camera_capture() {
        let mut camera = SyntheticCamera::new();
        camera.open(&small_config()).unwrap();
        let frame = camera.capture().unwrap();
        assert_eq!(frame.sequence(), 1);
        assert_eq!(frame.width(), 32);
    }
}
