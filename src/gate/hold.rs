//! Hold progress toward an automatic capture.

/// Nominal evaluation tick, in seconds.
pub const TICK_SECONDS: f64 = 0.05;

/// Time the gate must stay open to fill the ring, in seconds.
pub const HOLD_SECONDS: f64 = 0.7;

/// Progress gained per tick while capture is possible.
pub const HOLD_RISE_STEP: f64 = TICK_SECONDS / HOLD_SECONDS;

/// Progress lost per tick otherwise. Larger than the rise so the ring
/// drains faster than it fills.
pub const HOLD_DECAY_STEP: f64 = 0.08;

/// Accumulated float error tolerated when deciding the ring is full.
const COMPLETE_EPSILON: f64 = 1e-9;

/// Scalar in `[0, 1]` accumulating "stay still and valid" time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoldProgress {
    value: f64,
}

impl HoldProgress {
    /// Starts empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances one tick. Returns true when progress has reached 1.
    pub fn step(&mut self, can_capture: bool) -> bool {
        if can_capture {
            self.value += HOLD_RISE_STEP;
            if self.value >= 1.0 - COMPLETE_EPSILON {
                self.value = 1.0;
            }
        } else {
            self.value = (self.value - HOLD_DECAY_STEP).max(0.0);
        }
        self.is_complete()
    }

    /// True once the hold is full.
    pub fn is_complete(&self) -> bool {
        self.value >= 1.0
    }

    /// Current progress in `[0, 1]`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Empties the hold.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}
