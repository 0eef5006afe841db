//! Metrics collection and registry.

use crate::pipeline::{CounterSnapshot, LiveView};
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of pipeline state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames run through the scene estimator.
    pub frames_processed: u64,
    /// Detector passes completed.
    pub detector_runs: u64,
    /// Frames dropped because the detector was busy.
    pub detector_dropped: u64,
    /// Detector passes that failed.
    pub detector_failures: u64,
    /// Updates discarded after a stop.
    pub stale_updates: u64,
    /// Captures currently held.
    pub captured_images: usize,
    /// Current pose ordinal (0 front, 1 left, 2 right).
    pub pose: u8,
    /// Hold progress in `[0, 1]`.
    pub hold_progress: f64,
    /// Whether the gate is open.
    pub can_capture: bool,
    /// Latest exposure.
    pub exposure: f64,
    /// Latest glare ratio.
    pub glare_ratio: f64,
}

/// Prometheus metrics registry for the capture pipeline.
pub struct MetricsRegistry {
    registry: Registry,

    // Throughput
    frames_processed: IntCounter,
    detector_runs: IntCounter,
    detector_dropped: IntCounter,
    detector_failures: IntCounter,
    stale_updates: IntCounter,

    // Session
    captured_images: IntGauge,
    pose: IntGauge,
    hold_progress: Gauge,
    can_capture: IntGauge,

    // Scene
    exposure: Gauge,
    glare_ratio: Gauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_processed = IntCounter::new(
            "guided_capture_frames_processed_total",
            "Frames run through exposure and glare estimation",
        )?;
        let detector_runs = IntCounter::new(
            "guided_capture_detector_runs_total",
            "Face detector passes completed",
        )?;
        let detector_dropped = IntCounter::new(
            "guided_capture_detector_dropped_total",
            "Frames dropped because the face detector was busy",
        )?;
        let detector_failures = IntCounter::new(
            "guided_capture_detector_failures_total",
            "Face detector passes that failed",
        )?;
        let stale_updates = IntCounter::new(
            "guided_capture_stale_updates_total",
            "Analysis results discarded after the session stopped",
        )?;

        let captured_images = IntGauge::new(
            "guided_capture_captured_images",
            "Captures currently held by the session",
        )?;
        let pose = IntGauge::new(
            "guided_capture_target_pose",
            "Current target pose (0=front, 1=left, 2=right)",
        )?;
        let hold_progress = Gauge::new(
            "guided_capture_hold_progress",
            "Progress toward automatic capture",
        )?;
        let can_capture = IntGauge::new(
            "guided_capture_gate_open",
            "Whether every capture condition holds (1=open, 0=closed)",
        )?;

        let exposure = Gauge::new("guided_capture_exposure", "Mean sampled luminance")?;
        let glare_ratio = Gauge::new(
            "guided_capture_glare_ratio",
            "Fraction of sampled pixels near white",
        )?;

        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(detector_runs.clone()))?;
        registry.register(Box::new(detector_dropped.clone()))?;
        registry.register(Box::new(detector_failures.clone()))?;
        registry.register(Box::new(stale_updates.clone()))?;
        registry.register(Box::new(captured_images.clone()))?;
        registry.register(Box::new(pose.clone()))?;
        registry.register(Box::new(hold_progress.clone()))?;
        registry.register(Box::new(can_capture.clone()))?;
        registry.register(Box::new(exposure.clone()))?;
        registry.register(Box::new(glare_ratio.clone()))?;

        Ok(Self {
            registry,
            frames_processed,
            detector_runs,
            detector_dropped,
            detector_failures,
            stale_updates,
            captured_images,
            pose,
            hold_progress,
            can_capture,
            exposure,
            glare_ratio,
        })
    }

    /// Updates all metrics from a snapshot of pipeline state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward by the difference
        advance(&self.frames_processed, snapshot.frames_processed);
        advance(&self.detector_runs, snapshot.detector_runs);
        advance(&self.detector_dropped, snapshot.detector_dropped);
        advance(&self.detector_failures, snapshot.detector_failures);
        advance(&self.stale_updates, snapshot.stale_updates);

        self.captured_images.set(snapshot.captured_images as i64);
        self.pose.set(i64::from(snapshot.pose));
        self.hold_progress.set(snapshot.hold_progress);
        self.can_capture.set(i64::from(snapshot.can_capture));

        self.exposure.set(snapshot.exposure);
        self.glare_ratio.set(snapshot.glare_ratio);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from pipeline counters and the latest rendered view.
    pub fn from_components(counters: &CounterSnapshot, view: &LiveView) -> Self {
        Self {
            frames_processed: counters.frames_processed,
            detector_runs: counters.detector_runs,
            detector_dropped: counters.detector_dropped,
            detector_failures: counters.detector_failures,
            stale_updates: counters.stale_updates,
            captured_images: view.captured,
            pose: view.pose.ordinal(),
            hold_progress: view.ring.fill,
            can_capture: view.can_capture,
            exposure: view.state.scene.exposure,
            glare_ratio: view.state.scene.glare_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            frames_processed: 90,
            detector_runs: 30,
            detector_dropped: 2,
            captured_images: 2,
            pose: 2,
            can_capture: true,
            exposure: 0.6,
            ..Default::default()
        };
        registry.update(&snapshot);
        // Re-applying the same totals must not double count.
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("guided_capture_frames_processed_total 90"));
        assert!(output.contains("guided_capture_detector_dropped_total 2"));
        assert!(output.contains("guided_capture_captured_images 2"));
        assert!(output.contains("guided_capture_target_pose 2"));
        assert!(output.contains("guided_capture_gate_open 1"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("guided_capture_hold_progress"));
        assert!(output.contains("guided_capture_exposure"));
        assert!(output.contains("guided_capture_detector_runs_total"));
    }
}
