//! Prometheus metrics exporter for the capture pipeline.
//!
//! # Metrics Exposed
//!
//! ## Throughput
//! - `guided_capture_frames_processed_total` - Frames run through exposure/glare estimation
//! - `guided_capture_detector_runs_total` - Face detector passes completed
//! - `guided_capture_detector_dropped_total` - Frames dropped while the detector was busy
//! - `guided_capture_detector_failures_total` - Failed detector passes
//! - `guided_capture_stale_updates_total` - Results discarded after a stop
//!
//! ## Session
//! - `guided_capture_captured_images` - Captures currently held
//! - `guided_capture_target_pose` - Current target pose (0=front, 1=left, 2=right)
//! - `guided_capture_hold_progress` - Progress toward automatic capture
//! - `guided_capture_gate_open` - Whether every capture condition holds
//!
//! ## Scene
//! - `guided_capture_exposure` - Mean sampled luminance
//! - `guided_capture_glare_ratio` - Fraction of near-white samples
//!
//! # Example
//!
//! ```no_run
//! use guided_capture::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! registry.update(&MetricsSnapshot {
//!     frames_processed: 300,
//!     detector_runs: 100,
//!     captured_images: 1,
//!     hold_progress: 0.4,
//!     can_capture: true,
//!     exposure: 0.58,
//!     ..Default::default()
//! });
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState};
