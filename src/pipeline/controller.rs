//! Render-side driver for a live capture session.
//!
//! The controller is the single consumer of producer-side results. Each
//! tick it drains pending updates into a fresh [`PipelineState`], evaluates
//! the session against it, drives feedback, and returns a [`LiveView`] for
//! the UI to draw. Nothing else reads or writes that state.

use super::processor::{CounterSnapshot, FrameProcessor, PipelineCounters};
use super::{PipelineState, UpdateMailbox};
use crate::analysis::{FaceDetector, FaceGeometryEstimator};
use crate::capture::{
    AnalysisConfig, Camera, FileConfig, FrameSource, SourceStatus, StillImage,
};
use crate::feedback::{FeedbackCoordinator, FeedbackSink, RingStyle, VoicePromptKey};
use crate::gate::{GateInputs, TargetPose};
use crate::session::{CaptureEvent, CaptureSession, CapturedImage};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors starting the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The detector worker thread could not be created.
    #[error("failed to spawn detector worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// What the UI should offer the user to fix a blocked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Camera permission was denied; only system settings can grant it.
    OpenSystemSettings,
}

/// Everything the UI needs to render one tick.
#[derive(Debug, Clone)]
pub struct LiveView {
    /// Snapshot the tick was evaluated against.
    pub state: PipelineState,
    /// Pose the next capture is for.
    pub pose: TargetPose,
    /// Gate conditions derived from `state`.
    pub gate: GateInputs,
    /// Whether capture was allowed; false while the source is stopped.
    pub can_capture: bool,
    /// Hold-progress ring.
    pub ring: RingStyle,
    /// Highest-priority guidance for the user.
    pub prompt: VoicePromptKey,
    /// Number of accepted captures.
    pub captured: usize,
    /// Whether the finish action is available.
    pub finish_enabled: bool,
    /// Frame source status.
    pub source: SourceStatus,
    /// Action to offer when the session cannot proceed on its own.
    pub remediation: Option<Remediation>,
    /// Automatic capture fired on this tick.
    pub auto_capture: Option<CaptureEvent>,
}

/// Drives one guided capture session from the render thread.
pub struct LiveCaptureController {
    source: FrameSource,
    estimator: Arc<Mutex<FaceGeometryEstimator>>,
    analysis: AnalysisConfig,
    session: CaptureSession,
    feedback: FeedbackCoordinator,
    updates: UpdateMailbox,
    state: PipelineState,
    generation: u64,
    counters: Arc<PipelineCounters>,
}

impl LiveCaptureController {
    /// Builds a stopped controller. Nothing runs until [`start`](Self::start).
    pub fn new(
        camera: Box<dyn Camera>,
        detector: Box<dyn FaceDetector>,
        sink: Box<dyn FeedbackSink>,
        config: &FileConfig,
    ) -> Self {
        Self {
            source: FrameSource::new(camera, config.capture.clone()),
            estimator: Arc::new(Mutex::new(FaceGeometryEstimator::new(detector))),
            analysis: config.analysis.clone(),
            session: CaptureSession::new(&config.session),
            feedback: FeedbackCoordinator::new(sink, config.feedback.voice_enabled),
            updates: UpdateMailbox::new(),
            state: PipelineState::default(),
            generation: 0,
            counters: Arc::new(PipelineCounters::default()),
        }
    }

    /// Starts the camera and analysis. Idempotent while running.
    pub fn start(&mut self) -> Result<SourceStatus, PipelineError> {
        if self.source.is_running() {
            return Ok(self.source.status());
        }
        if self.session.is_finished() {
            tracing::debug!("Session already finished, not restarting");
            return Ok(self.source.status());
        }

        self.generation += 1;
        let mut processor = FrameProcessor::spawn(
            self.generation,
            &self.analysis,
            Arc::clone(&self.estimator),
            self.updates.clone(),
            Arc::clone(&self.counters),
        )?;

        let status = self.source.start(move |frame| processor.process(frame));
        tracing::info!(generation = self.generation, status = ?status, "Live capture started");
        Ok(status)
    }

    /// Stops the camera. Safe to call repeatedly and from teardown paths.
    ///
    /// Results still in flight from the stopped generation are discarded.
    /// The last published state stays visible.
    pub fn stop(&mut self) {
        let was_running = self.source.is_running();
        self.source.stop();
        if was_running {
            self.generation += 1;
            tracing::info!("Live capture stopped");
        }
    }

    /// One evaluation tick.
    pub fn tick(&mut self) -> LiveView {
        self.drain_updates();

        // A stopped source keeps its last state on screen but cannot capture.
        let outcome = if self.source.is_running() {
            self.session.evaluate(&self.state, &self.source)
        } else {
            self.session.evaluate_paused(&self.state)
        };
        if let Some(ref event) = outcome.capture {
            self.feedback.on_capture(event);
        }

        let prompt = VoicePromptKey::derive(&outcome.gate, &self.state.scene, self.session.pose());
        self.feedback.on_tick(prompt);

        let source = self.source.status();
        LiveView {
            state: self.state.clone(),
            pose: self.session.pose(),
            gate: outcome.gate,
            can_capture: outcome.can_capture,
            ring: RingStyle::new(outcome.hold_progress, outcome.can_capture),
            prompt,
            captured: self.session.store().len(),
            finish_enabled: self.session.can_finish(),
            source,
            remediation: (source == SourceStatus::PermissionDenied)
                .then_some(Remediation::OpenSystemSettings),
            auto_capture: outcome.capture,
        }
    }

    fn drain_updates(&mut self) {
        for update in self.updates.take() {
            if update.generation() != self.generation {
                self.counters.record_stale();
                continue;
            }
            self.state = self.state.apply(update);
        }
    }

    /// Manual shutter press. Ignored while the source is stopped.
    pub fn capture(&mut self) -> Option<CaptureEvent> {
        if !self.source.is_running() {
            return None;
        }
        let event = self.session.capture(&self.state, &self.source)?;
        self.feedback.on_capture(&event);
        Some(event)
    }

    /// Removes the last capture.
    pub fn undo(&mut self) -> Option<CapturedImage> {
        self.session.undo()
    }

    /// Hands the captures to `on_complete` and ends the session.
    pub fn finish<F>(&mut self, on_complete: F) -> bool
    where
        F: FnOnce(Vec<StillImage>),
    {
        let finished = self.session.finish(on_complete);
        if finished {
            self.stop();
        }
        finished
    }

    /// Turns voice prompts on or off.
    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.feedback.set_voice_enabled(enabled);
    }

    /// Last applied pipeline snapshot.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The capture session.
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// The frame source.
    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    /// The feedback coordinator.
    pub fn feedback(&self) -> &FeedbackCoordinator {
        &self.feedback
    }

    /// Current pipeline counters.
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Current session generation; bumped on every start and stop.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Producer-side mailbox; updates posted here are applied on the next tick.
    pub fn mailbox(&self) -> UpdateMailbox {
        self.updates.clone()
    }
}

impl Drop for LiveCaptureController {
    fn drop(&mut self) {
        self.stop();
    }
}
