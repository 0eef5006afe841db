//! Producer-side frame handling.
//!
//! Runs inside the frame source's delivery callback. Scene metrics are
//! computed inline for every frame; admitted frames are offered to the
//! detector worker through a bounded queue and dropped when it is full,
//! so a slow detector never holds up frame delivery. Results land in an
//! [`UpdateMailbox`] that keeps only the newest unread value of each kind.

use super::{PipelineUpdate, UpdateMailbox};
use crate::analysis::{FaceGeometryEstimator, FrameThrottle, SceneEstimator};
use crate::capture::{AnalysisConfig, FrameBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};

/// Pipeline activity counters, shared across threads.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    frames_processed: AtomicU64,
    detector_runs: AtomicU64,
    detector_dropped: AtomicU64,
    detector_failures: AtomicU64,
    stale_updates: AtomicU64,
}

/// Point-in-time copy of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Frames run through scene estimation.
    pub frames_processed: u64,
    /// Detector passes completed.
    pub detector_runs: u64,
    /// Frames dropped while the detector was busy.
    pub detector_dropped: u64,
    /// Detector passes that failed.
    pub detector_failures: u64,
    /// Updates discarded as stale.
    pub stale_updates: u64,
}

impl PipelineCounters {
    /// Reads every counter.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            detector_runs: self.detector_runs.load(Ordering::Relaxed),
            detector_dropped: self.detector_dropped.load(Ordering::Relaxed),
            detector_failures: self.detector_failures.load(Ordering::Relaxed),
            stale_updates: self.stale_updates.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_stale(&self) {
        self.stale_updates.fetch_add(1, Ordering::Relaxed);
    }
}

/// Handles each delivered frame on the producer thread.
pub struct FrameProcessor {
    generation: u64,
    scene: SceneEstimator,
    throttle: FrameThrottle,
    detector_queue: SyncSender<Arc<FrameBuffer>>,
    updates: UpdateMailbox,
    counters: Arc<PipelineCounters>,
}

impl FrameProcessor {
    /// Creates a processor and spawns its detector worker.
    ///
    /// The worker exits once the processor is dropped.
    pub fn spawn(
        generation: u64,
        config: &AnalysisConfig,
        estimator: Arc<Mutex<FaceGeometryEstimator>>,
        updates: UpdateMailbox,
        counters: Arc<PipelineCounters>,
    ) -> std::io::Result<Self> {
        let (detector_queue, frames) = mpsc::sync_channel(config.detector_queue_depth.max(1));
        let worker_updates = updates.clone();
        let worker_counters = Arc::clone(&counters);

        std::thread::Builder::new()
            .name("face-detector".into())
            .spawn(move || {
                detector_worker(frames, estimator, worker_updates, generation, worker_counters)
            })?;

        Ok(Self {
            generation,
            scene: SceneEstimator::new(),
            throttle: FrameThrottle::new(config.detector_every_n),
            detector_queue,
            updates,
            counters,
        })
    }

    /// Processes one delivered frame.
    pub fn process(&mut self, frame: &Arc<FrameBuffer>) {
        self.counters.frames_processed.fetch_add(1, Ordering::Relaxed);

        let metrics = self.scene.estimate(frame);
        self.updates.post(PipelineUpdate::Scene {
            generation: self.generation,
            sequence: frame.sequence(),
            metrics,
        });

        if !self.throttle.admit() {
            return;
        }

        match self.detector_queue.try_send(Arc::clone(frame)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.counters.detector_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(sequence = frame.sequence(), "Detector behind, dropping frame");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(sequence = frame.sequence(), "Detector worker gone");
            }
        }
    }
}

fn detector_worker(
    frames: Receiver<Arc<FrameBuffer>>,
    estimator: Arc<Mutex<FaceGeometryEstimator>>,
    updates: UpdateMailbox,
    generation: u64,
    counters: Arc<PipelineCounters>,
) {
    while let Ok(frame) = frames.recv() {
        let result = match estimator.lock() {
            Ok(mut estimator) => estimator.estimate(&frame),
            Err(_) => {
                tracing::warn!("Face estimator poisoned, detector worker exiting");
                return;
            }
        };
        counters.detector_runs.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(geometry) => {
                updates.post(PipelineUpdate::Face {
                    generation,
                    geometry,
                });
            }
            Err(e) => {
                counters.detector_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    sequence = frame.sequence(),
                    error = %e,
                    "Skipping face geometry for frame"
                );
            }
        }
    }
    tracing::debug!(generation, "Detector worker stopped");
}
