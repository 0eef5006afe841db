//! Rate limiting for the face detector stage.

/// Admits one frame out of every `every` offered.
///
/// The first frame offered is always admitted so overlays appear as soon
/// as the feed starts.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    every: u32,
    offered: u64,
}

impl FrameThrottle {
    /// Creates a throttle admitting every `every`th frame (minimum 1).
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            offered: 0,
        }
    }

    /// Offers a frame; returns true if it should go to the detector.
    pub fn admit(&mut self) -> bool {
        let admitted = self.offered % u64::from(self.every) == 0;
        self.offered += 1;
        admitted
    }

    /// Configured cadence.
    pub fn every(&self) -> u32 {
        self.every
    }

    /// Resets the cadence so the next frame is admitted.
    pub fn reset(&mut self) {
        self.offered = 0;
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_every_third() {
        let mut throttle = FrameThrottle::default();
        let admitted: Vec<bool> = (0..9).map(|_| throttle.admit()).collect();
        assert_eq!(
            admitted,
            vec![true, false, false, true, false, false, true, false, false]
        );
    }

    #[test]
    fn test_zero_cadence_admits_everything() {
        let mut throttle = FrameThrottle::new(0);
        assert_eq!(throttle.every(), 1);
        assert!((0..5).all(|_| throttle.admit()));
    }

    #[test]
    fn test_reset() {
        let mut throttle = FrameThrottle::new(4);
        assert!(throttle.admit());
        assert!(!throttle.admit());
        throttle.reset();
        assert!(throttle.admit());
    }
}
