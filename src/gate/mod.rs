//! Capture gating.
//!
//! The gate is a pure predicate over one pipeline snapshot: a face, good
//! exposure, no glare, and a head angle matching the current target pose.
//! Hold progress accumulates while the gate stays open and triggers the
//! automatic capture.

mod hold;
mod pose;
mod predicate;

pub use hold::{HoldProgress, HOLD_DECAY_STEP, HOLD_RISE_STEP, HOLD_SECONDS, TICK_SECONDS};
pub use pose::{TargetPose, FRONT_MAX_YAW_DEG, SIDE_MIN_YAW_DEG};
pub use predicate::GateInputs;
