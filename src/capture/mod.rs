//! Camera input and frame handling.
//!
//! This module owns the camera session: raw frame buffers, the producer
//! thread that delivers them, and still images rendered from the most
//! recent frame. A synthetic placeholder feed stands in when no camera
//! hardware exists.

mod camera;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod source;
mod still;

pub use camera::{AuthorizationStatus, Camera, CameraError, MockCamera, SyntheticCamera};
pub use config::{
    AnalysisConfig, CaptureConfig, ConfigError, FeedbackConfig, FileConfig, OutputConfig,
    SessionConfig,
};
pub use frame::{FrameBuffer, PixelFormat};
#[cfg(feature = "camera")]
pub use native::NativeCamera;
pub use source::{FrameSource, LatestFrame, SourceStatus, StillSource};
pub use still::StillImage;
