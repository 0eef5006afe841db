//! Capture sequencing: front, then left, then right.
//!
//! The session owns the pose sequence, hold progress and the capture store.
//! It is driven from one thread: `evaluate` once per tick, plus the manual
//! actions (capture, undo, finish) in between.

use super::{CaptureStore, CapturedImage};
use crate::capture::{SessionConfig, StillImage, StillSource};
use crate::gate::{GateInputs, HoldProgress, TargetPose};
use crate::pipeline::PipelineState;

/// What caused a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTrigger {
    /// Shutter pressed while the gate was open.
    Manual,
    /// Hold progress completed.
    Automatic,
}

/// An accepted capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEvent {
    /// What caused the capture.
    pub trigger: CaptureTrigger,
    /// Pose the capture was taken for.
    pub pose: TargetPose,
    /// Store size after the capture.
    pub count: usize,
    /// Sequence of the frame the still came from.
    pub sequence: u64,
}

/// Result of one evaluation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Gate conditions for the current pose.
    pub gate: GateInputs,
    /// Whether capture was allowed on this tick.
    pub can_capture: bool,
    /// Hold progress after this tick.
    pub hold_progress: f64,
    /// Set when the tick fired an automatic capture.
    pub capture: Option<CaptureEvent>,
}

/// One guided capture session.
#[derive(Debug)]
pub struct CaptureSession {
    pose: TargetPose,
    hold: HoldProgress,
    store: CaptureStore,
    required: usize,
    block_multiple_faces: bool,
    finished: bool,
}

impl CaptureSession {
    /// Starts a session at the front pose with an empty store.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            pose: TargetPose::Front,
            hold: HoldProgress::new(),
            store: CaptureStore::new(),
            required: config.required_captures.max(1),
            block_multiple_faces: config.block_multiple_faces,
            finished: false,
        }
    }

    /// Gate conditions for the current pose.
    pub fn gate(&self, state: &PipelineState) -> GateInputs {
        state.gate_inputs(self.pose, self.block_multiple_faces)
    }

    /// Runs one tick: updates hold progress and fires the automatic capture
    /// when it completes.
    ///
    /// If no still is available when the hold completes, progress stays full
    /// and the capture is retried on the next tick.
    pub fn evaluate(&mut self, state: &PipelineState, stills: &dyn StillSource) -> TickOutcome {
        let gate = self.gate(state);
        let can_capture = gate.can_capture();
        let mut capture = None;

        if !self.finished && self.hold.step(can_capture) {
            capture = self.accept(CaptureTrigger::Automatic, stills);
            if capture.is_some() {
                self.hold.reset();
            }
        }

        TickOutcome {
            gate,
            can_capture,
            hold_progress: self.hold.value(),
            capture,
        }
    }

    /// Runs one tick while no frames are arriving.
    ///
    /// The gate is still derived so the last state can be rendered, but
    /// capture is treated as blocked: hold progress decays and nothing fires.
    pub fn evaluate_paused(&mut self, state: &PipelineState) -> TickOutcome {
        let gate = self.gate(state);
        self.hold.step(false);

        TickOutcome {
            gate,
            can_capture: false,
            hold_progress: self.hold.value(),
            capture: None,
        }
    }

    /// Manual capture. Only honoured while the gate is open.
    ///
    /// Hold progress is left untouched.
    pub fn capture(
        &mut self,
        state: &PipelineState,
        stills: &dyn StillSource,
    ) -> Option<CaptureEvent> {
        if self.finished || !self.gate(state).can_capture() {
            return None;
        }
        self.accept(CaptureTrigger::Manual, stills)
    }

    fn accept(
        &mut self,
        trigger: CaptureTrigger,
        stills: &dyn StillSource,
    ) -> Option<CaptureEvent> {
        let Some(image) = stills.capture_current_image() else {
            tracing::debug!(?trigger, "Capture skipped, no frame delivered yet");
            return None;
        };

        let pose = self.pose;
        let sequence = image.sequence();
        self.store.append(CapturedImage { image, pose });
        self.pose = pose.next();

        let event = CaptureEvent {
            trigger,
            pose,
            count: self.store.len(),
            sequence,
        };
        tracing::info!(
            ?trigger,
            pose = %pose,
            next = %self.pose,
            count = event.count,
            sequence,
            "Capture accepted"
        );
        Some(event)
    }

    /// Removes the last capture. The pose sequence is not rewound.
    pub fn undo(&mut self) -> Option<CapturedImage> {
        let removed = self.store.remove_last();
        if let Some(ref capture) = removed {
            tracing::info!(
                pose = %capture.pose,
                remaining = self.store.len(),
                "Capture removed"
            );
        }
        removed
    }

    /// True once enough captures exist to finish.
    pub fn can_finish(&self) -> bool {
        !self.finished && self.store.len() >= self.required
    }

    /// Hands the first `required` stills to `on_complete` and ends the session.
    ///
    /// Returns false, without calling `on_complete`, if too few captures
    /// exist or the session already finished.
    pub fn finish<F>(&mut self, on_complete: F) -> bool
    where
        F: FnOnce(Vec<StillImage>),
    {
        if !self.can_finish() {
            return false;
        }
        self.finished = true;
        let stills = self.store.first_stills(self.required);
        tracing::info!(
            handed_over = stills.len(),
            captured = self.store.len(),
            "Session finished"
        );
        on_complete(stills);
        true
    }

    /// Pose the next capture is for.
    pub fn pose(&self) -> TargetPose {
        self.pose
    }

    /// Current hold progress in `[0, 1]`.
    pub fn hold_progress(&self) -> f64 {
        self.hold.value()
    }

    /// Accepted captures, oldest first.
    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    /// Captures needed to finish.
    pub fn required(&self) -> usize {
        self.required
    }

    /// Whether more than one visible face blocks capture.
    pub fn block_multiple_faces(&self) -> bool {
        self.block_multiple_faces
    }

    /// True once `finish` has handed the stills over.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FrameBuffer, LatestFrame};
    use crate::pipeline::state::fixtures::{ready_front, state};
    use std::sync::Arc;

    fn stills() -> LatestFrame {
        let latest = LatestFrame::new(true);
        latest.store(Arc::new(FrameBuffer::solid(4, 4, (150, 150, 150), 1)));
        latest
    }

    fn session() -> CaptureSession {
        CaptureSession::new(&SessionConfig::default())
    }

    /// Ticks until an automatic capture fires.
    fn hold_until_capture(
        session: &mut CaptureSession,
        state: &PipelineState,
        stills: &LatestFrame,
    ) -> CaptureEvent {
        for _ in 0..100 {
            if let Some(event) = session.evaluate(state, stills).capture {
                return event;
            }
        }
        panic!("hold never completed");
    }

    #[test]
    fn test_manual_capture_advances_pose_keeps_hold() {
        let mut session = session();
        let stills = stills();
        let ready = ready_front();

        session.evaluate(&ready, &stills);
        let hold = session.hold_progress();
        assert!(hold > 0.0);

        let event = session.capture(&ready, &stills).unwrap();
        assert_eq!(event.trigger, CaptureTrigger::Manual);
        assert_eq!(event.pose, TargetPose::Front);
        assert_eq!(session.pose(), TargetPose::Left);
        assert_eq!(session.hold_progress(), hold);
    }

    #[test]
    fn test_manual_capture_requires_open_gate() {
        let mut session = session();
        let dark = state(0.2, 0.0, &[0.0]);
        assert!(session.capture(&dark, &stills()).is_none());
        assert!(session.store().is_empty());
        assert_eq!(session.pose(), TargetPose::Front);
    }

    #[test]
    fn test_capture_without_frame_is_noop() {
        let mut session = session();
        let empty = LatestFrame::new(true);
        assert!(session.capture(&ready_front(), &empty).is_none());
        assert_eq!(session.pose(), TargetPose::Front);
    }

    #[test]
    fn test_malformed_frame_is_noop() {
        let mut session = session();
        let broken = LatestFrame::new(true);
        broken.store(Arc::new(FrameBuffer::new(
            vec![0; 10],
            50,
            50,
            crate::capture::PixelFormat::Rgb8,
            1,
        )));

        assert!(session.capture(&ready_front(), &broken).is_none());
        for _ in 0..20 {
            assert!(session.evaluate(&ready_front(), &broken).capture.is_none());
        }
        assert!(session.store().is_empty());
        assert_eq!(session.pose(), TargetPose::Front);
    }

    #[test]
    fn test_paused_ticks_decay_hold_without_capturing() {
        let mut session = session();
        let stills = stills();
        let ready = ready_front();

        for _ in 0..10 {
            session.evaluate(&ready, &stills);
        }
        let built = session.hold_progress();
        assert!(built > 0.5);

        let outcome = session.evaluate_paused(&ready);
        assert!(outcome.gate.can_capture());
        assert!(!outcome.can_capture);
        assert!(outcome.hold_progress < built);

        for _ in 0..30 {
            assert!(session.evaluate_paused(&ready).capture.is_none());
        }
        assert_eq!(session.hold_progress(), 0.0);
        assert!(session.store().is_empty());
        assert_eq!(session.pose(), TargetPose::Front);
    }

    #[test]
    fn test_auto_capture_matches_manual_and_resets_hold() {
        let stills = stills();
        let ready = ready_front();

        let mut manual = session();
        manual.capture(&ready, &stills).unwrap();

        let mut auto = session();
        let event = hold_until_capture(&mut auto, &ready, &stills);

        assert_eq!(event.trigger, CaptureTrigger::Automatic);
        assert_eq!(auto.pose(), manual.pose());
        assert_eq!(auto.store().len(), manual.store().len());
        assert_eq!(auto.store().iter().next().unwrap().pose, TargetPose::Front);
        assert_eq!(auto.hold_progress(), 0.0);
    }

    #[test]
    fn test_auto_capture_waits_for_frame() {
        let mut session = session();
        let ready = ready_front();
        let empty = LatestFrame::new(true);

        for _ in 0..20 {
            assert!(session.evaluate(&ready, &empty).capture.is_none());
        }
        assert_eq!(session.hold_progress(), 1.0);

        let event = session.evaluate(&ready, &stills()).capture;
        assert!(event.is_some());
        assert_eq!(session.hold_progress(), 0.0);
    }

    #[test]
    fn test_full_guided_sequence() {
        let mut session = session();
        let stills = stills();

        hold_until_capture(&mut session, &state(0.6, 0.0, &[0.0]), &stills);
        assert_eq!(session.pose(), TargetPose::Left);

        // Still facing front: left pose not satisfied, nothing fires.
        for _ in 0..30 {
            assert!(session.evaluate(&state(0.6, 0.0, &[0.0]), &stills).capture.is_none());
        }

        hold_until_capture(&mut session, &state(0.6, 0.0, &[0.3]), &stills);
        assert_eq!(session.pose(), TargetPose::Right);

        hold_until_capture(&mut session, &state(0.6, 0.0, &[-0.3]), &stills);
        assert_eq!(session.pose(), TargetPose::Right);
        assert_eq!(session.store().len(), 3);

        let poses: Vec<TargetPose> = session.store().iter().map(|c| c.pose).collect();
        assert_eq!(poses, vec![TargetPose::Front, TargetPose::Left, TargetPose::Right]);
    }

    #[test]
    fn test_finish_gating() {
        let mut session = session();
        let stills = stills();
        let ready = ready_front();
        let mut handed = None;

        session.capture(&ready, &stills);
        assert!(!session.finish(|s| handed = Some(s)));
        assert!(handed.is_none());

        session.capture(&state(0.6, 0.0, &[0.3]), &stills);
        session.capture(&state(0.6, 0.0, &[-0.3]), &stills);
        session.capture(&state(0.6, 0.0, &[-0.3]), &stills);
        assert_eq!(session.store().len(), 4);

        assert!(session.finish(|s| handed = Some(s)));
        assert_eq!(handed.map(|s| s.len()), Some(3));

        // Only once.
        assert!(!session.finish(|_| panic!("finished twice")));
    }

    #[test]
    fn test_finish_hands_over_in_capture_order() {
        let mut session = session();
        let latest = LatestFrame::new(false);
        let yaws = [0.0, 0.3, -0.3];

        for (i, yaw) in yaws.iter().enumerate() {
            latest.store(Arc::new(FrameBuffer::solid(2, 2, (120, 120, 120), 10 + i as u64)));
            session.capture(&state(0.6, 0.0, &[*yaw]), &latest).unwrap();
        }

        let mut sequences = Vec::new();
        assert!(session.finish(|s| sequences = s.iter().map(|i| i.sequence()).collect()));
        assert_eq!(sequences, vec![10, 11, 12]);
    }

    #[test]
    fn test_undo_does_not_rewind_pose() {
        let mut session = session();
        let stills = stills();

        assert!(session.undo().is_none());

        session.capture(&ready_front(), &stills).unwrap();
        assert_eq!(session.pose(), TargetPose::Left);

        let removed = session.undo().unwrap();
        assert_eq!(removed.pose, TargetPose::Front);
        assert!(session.store().is_empty());
        // Retake happens at the advanced pose.
        assert_eq!(session.pose(), TargetPose::Left);
    }
}
