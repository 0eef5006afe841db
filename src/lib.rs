//! Guided Live Capture
//!
//! A real-time camera pipeline that walks a user through a front, left and
//! right face capture. Every frame is checked for exposure and glare, a
//! throttled detector tracks the face and head yaw, and a capture fires
//! automatically once all conditions have held for long enough.
//!
//! # Architecture
//!
//! ```text
//! capture ──→ analysis (scene every frame, face every Nth) ──→ pipeline
//!                                                               ↓
//!                           feedback ←── session ←── gate ←── PipelineState
//! ```
//!
//! # Design Principles
//!
//! - **Frame delivery never waits**: the detector is throttled and late
//!   frames are dropped, not queued
//! - **One reader**: analysis results are marshaled to a single render-side
//!   controller that owns all session state
//! - **Pure gate**: capture decisions are a function of one immutable snapshot
//! - **Degrade, don't fail**: missing hardware, denied permission and
//!   detector failures all leave the session waiting instead of erroring
//!
//! # Example
//!
//! ```no_run
//! use guided_capture::{
//!     analysis::ScriptedDetector,
//!     capture::{FileConfig, SyntheticCamera},
//!     feedback::TracingFeedback,
//!     pipeline::LiveCaptureController,
//! };
//!
//! let config = FileConfig::default();
//! let mut controller = LiveCaptureController::new(
//!     Box::new(SyntheticCamera::new()),
//!     Box::new(ScriptedDetector::pose_sweep(20, 0.35)),
//!     Box::new(TracingFeedback),
//!     &config,
//! );
//! controller.start().unwrap();
//!
//! while !controller.session().can_finish() {
//!     let view = controller.tick();
//!     println!("{} {:.2}", view.prompt, view.ring.fill);
//!     std::thread::sleep(config.session.tick_period());
//! }
//!
//! controller.finish(|stills| println!("captured {}", stills.len()));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod feedback;
pub mod gate;
pub mod metrics;
pub mod pipeline;
pub mod session;

// Re-export commonly used types at crate root
pub use analysis::{FaceDetector, FaceGeometry, SceneMetrics};
pub use capture::{Camera, FileConfig, FrameBuffer, StillImage, SyntheticCamera};
pub use feedback::{FeedbackSink, VoicePromptKey};
pub use gate::{GateInputs, TargetPose};
pub use pipeline::{LiveCaptureController, LiveView, PipelineState};
pub use session::CaptureSession;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
