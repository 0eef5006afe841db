//! The auto-capture predicate.

/// The four conditions that must hold together before a capture.
///
/// Derived fresh from the pipeline state on every evaluation; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateInputs {
    /// A single usable face is visible.
    pub face_detected: bool,
    /// Exposure is within range.
    pub exposure_ok: bool,
    /// Glare is below the limit.
    pub glare_ok: bool,
    /// Yaw matches the target pose.
    pub angle_satisfied: bool,
}

impl GateInputs {
    /// True only when every condition holds.
    pub fn can_capture(&self) -> bool {
        self.face_detected && self.exposure_ok && self.glare_ok && self.angle_satisfied
    }
}
