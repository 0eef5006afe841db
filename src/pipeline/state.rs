//! The immutable snapshot the render thread evaluates each tick.

use crate::analysis::{FaceGeometry, FacePresence, SceneMetrics};
use crate::gate::{GateInputs, TargetPose};

/// Result of one producer-side computation, marshaled to the render thread.
#[derive(Debug, Clone)]
pub enum PipelineUpdate {
    /// Exposure and glare for one frame.
    Scene {
        /// Session generation that produced it.
        generation: u64,
        /// Sequence of the source frame.
        sequence: u64,
        /// The frame's lighting statistics.
        metrics: SceneMetrics,
    },
    /// Face geometry from one detector pass.
    Face {
        /// Session generation that produced it.
        generation: u64,
        /// Detected faces and guides.
        geometry: FaceGeometry,
    },
}

impl PipelineUpdate {
    /// Session generation the update was produced for.
    pub fn generation(&self) -> u64 {
        match self {
            PipelineUpdate::Scene { generation, .. } | PipelineUpdate::Face { generation, .. } => {
                *generation
            }
        }
    }
}

/// Everything the gate, sequencer and feedback need from the analysers.
///
/// Each field holds the latest published value; a skipped detector frame
/// leaves the previous face geometry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    /// Latest exposure and glare.
    pub scene: SceneMetrics,
    /// Latest face geometry.
    pub face: FaceGeometry,
    /// Sequence of the frame the scene metrics came from.
    pub frame_sequence: u64,
}

impl PipelineState {
    /// Folds an update into a new snapshot.
    pub fn apply(&self, update: PipelineUpdate) -> Self {
        let mut next = self.clone();
        match update {
            PipelineUpdate::Scene {
                sequence, metrics, ..
            } => {
                next.scene = metrics;
                next.frame_sequence = sequence;
            }
            PipelineUpdate::Face { geometry, .. } => next.face = geometry,
        }
        next
    }

    /// Derives the gate conditions for `pose`.
    ///
    /// With `block_multiple_faces` set, more than one visible face counts as
    /// no usable face. Otherwise the largest face stands in for the subject.
    pub fn gate_inputs(&self, pose: TargetPose, block_multiple_faces: bool) -> GateInputs {
        let subject = match self.face.presence {
            FacePresence::None => None,
            FacePresence::One => self.face.primary(),
            FacePresence::Multiple if block_multiple_faces => None,
            FacePresence::Multiple => self.face.largest(),
        };

        GateInputs {
            face_detected: subject.is_some(),
            exposure_ok: self.scene.exposure_ok,
            glare_ok: self.scene.glare_ok,
            angle_satisfied: pose.angle_satisfied(subject.and_then(|f| f.yaw)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::state;
    use super::*;

    #[test]
    fn test_all_conditions_met() {
        let inputs = state(0.6, 0.0, &[0.25]).gate_inputs(TargetPose::Left, true);
        assert!(inputs.can_capture());
    }

    #[test]
    fn test_left_pose_angle_example() {
        let s = state(0.6, 0.0, &[0.15]);
        let inputs = s.gate_inputs(TargetPose::Left, true);
        assert!(inputs.face_detected && inputs.exposure_ok && inputs.glare_ok);
        assert!(!inputs.angle_satisfied);
    }

    #[test]
    fn test_multiple_faces_blocked() {
        let s = state(0.6, 0.0, &[0.0, 0.0]);
        assert!(!s.gate_inputs(TargetPose::Front, true).face_detected);
        assert!(s.gate_inputs(TargetPose::Front, false).can_capture());
    }

    #[test]
    fn test_apply_keeps_other_fields() {
        let s = state(0.6, 0.0, &[0.0]);
        let next = s.apply(PipelineUpdate::Scene {
            generation: 0,
            sequence: 42,
            metrics: SceneMetrics::from_stats(0.1, 0.0, Vec::new(), 10),
        });

        assert_eq!(next.frame_sequence, 42);
        assert!(!next.scene.exposure_ok);
        assert_eq!(next.face, s.face);
    }

    #[test]
    fn test_initial_state_blocks_capture() {
        let inputs = PipelineState::default().gate_inputs(TargetPose::Front, true);
        assert!(!inputs.face_detected);
        assert!(!inputs.exposure_ok);
        assert!(!inputs.can_capture());
    }
}
