//! Exposure and glare estimation from raw pixels.
//!
//! Runs synchronously on every delivered frame. The buffer is sparse-sampled
//! on a fixed stride so the per-frame cost does not grow with resolution.

use crate::capture::FrameBuffer;
use serde::{Deserialize, Serialize};

/// Approximate number of pixels examined per frame.
pub const SAMPLE_BUDGET: usize = 20_000;

/// Exposure must be strictly above this to be acceptable. Empirical, tunable.
pub const EXPOSURE_MIN: f64 = 0.35;

/// Exposure must be strictly below this to be acceptable. Empirical, tunable.
pub const EXPOSURE_MAX: f64 = 0.9;

/// Every channel must exceed this fraction of full scale for a glare pixel.
pub const GLARE_CHANNEL_MIN: f64 = 0.97;

/// Glare ratio must be strictly below this to be acceptable. Empirical, tunable.
pub const GLARE_RATIO_MAX: f64 = 0.03;

/// Cap on glare points reported for rendering.
pub const MAX_GLARE_POINTS: usize = 32;

/// A point in normalized view coordinates (0-1, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Horizontal position, 0 at the left.
    pub x: f32,
    /// Vertical position, 0 at the top.
    pub y: f32,
}

/// Lighting statistics for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetrics {
    /// Mean sampled luminance in `[0, 1]`.
    pub exposure: f64,
    /// True iff exposure lies strictly inside the acceptance window.
    pub exposure_ok: bool,
    /// Fraction of sampled pixels classified as glare, in `[0, 1]`.
    pub glare_ratio: f64,
    /// True iff the glare ratio is below the limit.
    pub glare_ok: bool,
    /// Up to `MAX_GLARE_POINTS` glare locations in buffer orientation.
    pub glare_points: Vec<NormalizedPoint>,
    /// Number of pixels examined.
    pub sample_count: usize,
}

impl Default for SceneMetrics {
    /// Metrics before any frame has been seen: dark and not acceptable.
    fn default() -> Self {
        Self::from_stats(0.0, 0.0, Vec::new(), 0)
    }
}

impl SceneMetrics {
    /// Builds metrics from raw statistics, applying the acceptance thresholds.
    pub fn from_stats(
        exposure: f64,
        glare_ratio: f64,
        glare_points: Vec<NormalizedPoint>,
        sample_count: usize,
    ) -> Self {
        Self {
            exposure,
            exposure_ok: exposure > EXPOSURE_MIN && exposure < EXPOSURE_MAX,
            glare_ratio,
            glare_ok: glare_ratio < GLARE_RATIO_MAX,
            glare_points,
            sample_count,
        }
    }

    /// True when the scene is too dark (as opposed to too bright).
    pub fn is_underexposed(&self) -> bool {
        self.exposure <= EXPOSURE_MIN
    }
}

/// Computes exposure and glare for a frame. Stateless between frames.
#[derive(Debug, Clone, Copy)]
pub struct SceneEstimator {
    sample_budget: usize,
}

impl SceneEstimator {
    /// Creates an estimator with the default sample budget.
    pub fn new() -> Self {
        Self {
            sample_budget: SAMPLE_BUDGET,
        }
    }

    /// Creates an estimator with a custom sample budget.
    pub fn with_budget(sample_budget: usize) -> Self {
        Self {
            sample_budget: sample_budget.max(1),
        }
    }

    /// Sampling stride for a frame of the given size.
    pub fn stride(&self, width: u32, height: u32) -> usize {
        ((width as usize) * (height as usize) / self.sample_budget).max(1)
    }

    /// Samples the frame and returns its lighting statistics.
    pub fn estimate(&self, frame: &FrameBuffer) -> SceneMetrics {
        if !frame.is_valid() || frame.pixel_count() == 0 {
            tracing::debug!(?frame, "Skipping metrics for malformed frame");
            return SceneMetrics::default();
        }

        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let step = self.stride(frame.width(), frame.height());
        let glare_min = GLARE_CHANNEL_MIN * 255.0;

        let mut luminance_sum = 0.0;
        let mut samples = 0usize;
        let mut glare_count = 0usize;
        let mut glare_points = Vec::new();

        for i in (0..frame.pixel_count()).step_by(step) {
            let (r, g, b) = frame.rgb_at(i);
            let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));

            luminance_sum += (0.2126 * r + 0.7152 * g + 0.0722 * b) / 255.0;
            samples += 1;

            if r > glare_min && g > glare_min && b > glare_min {
                glare_count += 1;
                if glare_points.len() < MAX_GLARE_POINTS {
                    glare_points.push(NormalizedPoint {
                        x: (i % width) as f32 / width as f32,
                        y: (i / width) as f32 / height as f32,
                    });
                }
            }
        }

        let exposure = (luminance_sum / samples as f64).clamp(0.0, 1.0);
        let glare_ratio = glare_count as f64 / samples as f64;
        let metrics = SceneMetrics::from_stats(exposure, glare_ratio, glare_points, samples);

        tracing::trace!(
            sequence = frame.sequence(),
            exposure = metrics.exposure,
            glare_ratio = metrics.glare_ratio,
            samples,
            "Scene metrics"
        );

        metrics
    }
}

impl Default for SceneEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PixelFormat;

    fn gray(level: f64) -> FrameBuffer {
        let v = (level * 255.0).round() as u8;
        FrameBuffer::solid(320, 240, (v, v, v), 1)
    }

    #[test]
    fn test_dark_frame() {
        let metrics = SceneEstimator::new().estimate(&gray(0.2));
        assert!((metrics.exposure - 0.2).abs() < 0.01);
        assert!(!metrics.exposure_ok);
        assert!(metrics.is_underexposed());
    }

    #[test]
    fn test_bright_frame() {
        let metrics = SceneEstimator::new().estimate(&gray(0.95));
        assert!(!metrics.exposure_ok);
        assert!(!metrics.is_underexposed());
        // 242 is bright but below the near-white cut.
        assert!(metrics.glare_ok);
    }

    #[test]
    fn test_well_lit_frame() {
        let metrics = SceneEstimator::new().estimate(&gray(0.6));
        assert!(metrics.exposure_ok);
        assert!(metrics.glare_ok);
        assert_eq!(metrics.glare_ratio, 0.0);
        assert!(metrics.glare_points.is_empty());
    }

    #[test]
    fn test_stride_bounds_sample_count() {
        let estimator = SceneEstimator::new();
        assert_eq!(estimator.stride(100, 100), 1);
        assert_eq!(estimator.stride(1920, 1080), 103);

        let frame = FrameBuffer::solid(1920, 1080, (128, 128, 128), 1);
        let metrics = estimator.estimate(&frame);
        assert!(metrics.sample_count >= SAMPLE_BUDGET);
        assert!(metrics.sample_count < SAMPLE_BUDGET * 2);
    }

    #[test]
    fn test_glare_detected_and_points_capped() {
        // Left half white, right half mid-gray.
        let (w, h) = (200u32, 100u32);
        let mut pixels = Vec::new();
        for _y in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 255 } else { 128 };
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        let frame = FrameBuffer::new(pixels, w, h, PixelFormat::Rgb8, 1);
        let metrics = SceneEstimator::new().estimate(&frame);

        assert!((metrics.glare_ratio - 0.5).abs() < 0.01);
        assert!(!metrics.glare_ok);
        assert_eq!(metrics.glare_points.len(), MAX_GLARE_POINTS);
        assert!(metrics.glare_points.iter().all(|p| p.x < 0.5));
    }

    #[test]
    fn test_glare_requires_all_channels() {
        let frame = FrameBuffer::solid(50, 50, (255, 255, 200), 1);
        let metrics = SceneEstimator::new().estimate(&frame);
        assert_eq!(metrics.glare_ratio, 0.0);
    }

    #[test]
    fn test_malformed_frame_yields_default() {
        let frame = FrameBuffer::new(vec![0u8; 10], 50, 50, PixelFormat::Rgb8, 1);
        let metrics = SceneEstimator::new().estimate(&frame);
        assert_eq!(metrics, SceneMetrics::default());
    }

    #[test]
    fn test_threshold_edges_are_exclusive() {
        assert!(!SceneMetrics::from_stats(EXPOSURE_MIN, 0.0, Vec::new(), 1).exposure_ok);
        assert!(!SceneMetrics::from_stats(EXPOSURE_MAX, 0.0, Vec::new(), 1).exposure_ok);
        assert!(!SceneMetrics::from_stats(0.5, GLARE_RATIO_MAX, Vec::new(), 1).glare_ok);
    }
}
