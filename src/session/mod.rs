//! Capture sequencing and storage.
//!
//! A session walks the user through front, left and right captures, keeps
//! the accepted stills in order, and hands the first three over on finish.

mod sequencer;
mod store;

pub use sequencer::{CaptureEvent, CaptureSession, CaptureTrigger, TickOutcome};
pub use store::{CaptureStore, CapturedImage};
