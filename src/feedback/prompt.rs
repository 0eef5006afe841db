//! Voice prompt selection.

use crate::analysis::SceneMetrics;
use crate::gate::{GateInputs, TargetPose};
use serde::{Deserialize, Serialize};

/// The single problem surfaced to the user on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePromptKey {
    /// No usable face in view.
    NoFace,
    /// Scene too dark.
    TooDark,
    /// Scene too bright.
    TooBright,
    /// Glare on the face.
    Glare,
    /// Turn toward the left pose.
    TurnLeft,
    /// Turn toward the right pose.
    TurnRight,
    /// Face the camera.
    Center,
    /// Everything is fine; hold still.
    Hold,
}

impl VoicePromptKey {
    /// Picks the prompt for the current tick.
    ///
    /// Precedence: no face, then exposure, then glare, then angle, and
    /// finally "hold" when only stillness is missing.
    pub fn derive(gate: &GateInputs, scene: &SceneMetrics, pose: TargetPose) -> Self {
        if !gate.face_detected {
            VoicePromptKey::NoFace
        } else if !gate.exposure_ok {
            if scene.is_underexposed() {
                VoicePromptKey::TooDark
            } else {
                VoicePromptKey::TooBright
            }
        } else if !gate.glare_ok {
            VoicePromptKey::Glare
        } else if !gate.angle_satisfied {
            match pose {
                TargetPose::Front => VoicePromptKey::Center,
                TargetPose::Left => VoicePromptKey::TurnLeft,
                TargetPose::Right => VoicePromptKey::TurnRight,
            }
        } else {
            VoicePromptKey::Hold
        }
    }

    /// Stable reason code.
    pub fn as_str(self) -> &'static str {
        match self {
            VoicePromptKey::NoFace => "no_face",
            VoicePromptKey::TooDark => "too_dark",
            VoicePromptKey::TooBright => "too_bright",
            VoicePromptKey::Glare => "glare",
            VoicePromptKey::TurnLeft => "turn_left",
            VoicePromptKey::TurnRight => "turn_right",
            VoicePromptKey::Center => "center",
            VoicePromptKey::Hold => "hold",
        }
    }

    /// Spoken text.
    pub fn phrase(self) -> &'static str {
        match self {
            VoicePromptKey::NoFace => "Place your face inside the frame.",
            VoicePromptKey::TooDark => "It's too dark. Move somewhere brighter.",
            VoicePromptKey::TooBright => "It's too bright. Step out of direct light.",
            VoicePromptKey::Glare => "There is glare on your skin. Turn away from the light.",
            VoicePromptKey::TurnLeft => "Slowly turn your head to the left.",
            VoicePromptKey::TurnRight => "Slowly turn your head to the right.",
            VoicePromptKey::Center => "Look straight at the camera.",
            VoicePromptKey::Hold => "Hold still.",
        }
    }
}

impl std::fmt::Display for VoicePromptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{SceneEstimator, SceneMetrics};
    use crate::capture::FrameBuffer;

    fn gate(face: bool, exposure: bool, glare: bool, angle: bool) -> GateInputs {
        GateInputs {
            face_detected: face,
            exposure_ok: exposure,
            glare_ok: glare,
            angle_satisfied: angle,
        }
    }

    fn scene(exposure: f64) -> SceneMetrics {
        SceneMetrics::from_stats(exposure, 0.0, Vec::new(), 1)
    }

    fn key(gate: GateInputs, exposure: f64, pose: TargetPose) -> VoicePromptKey {
        VoicePromptKey::derive(&gate, &scene(exposure), pose)
    }

    #[test]
    fn test_no_face_wins_over_everything() {
        let prompt = key(gate(false, false, false, false), 0.1, TargetPose::Left);
        assert_eq!(prompt, VoicePromptKey::NoFace);
    }

    #[test]
    fn test_exposure_before_glare() {
        let g = gate(true, false, false, false);
        assert_eq!(key(g, 0.1, TargetPose::Front), VoicePromptKey::TooDark);
        assert_eq!(key(g, 0.95, TargetPose::Front), VoicePromptKey::TooBright);
    }

    #[test]
    fn test_glare_before_angle() {
        let prompt = key(gate(true, true, false, false), 0.6, TargetPose::Left);
        assert_eq!(prompt, VoicePromptKey::Glare);
    }

    #[test]
    fn test_angle_prompt_per_pose() {
        let g = gate(true, true, true, false);
        let s = scene(0.6);
        assert_eq!(VoicePromptKey::derive(&g, &s, TargetPose::Front), VoicePromptKey::Center);
        assert_eq!(VoicePromptKey::derive(&g, &s, TargetPose::Left), VoicePromptKey::TurnLeft);
        assert_eq!(VoicePromptKey::derive(&g, &s, TargetPose::Right), VoicePromptKey::TurnRight);
    }

    #[test]
    fn test_hold_when_everything_satisfied() {
        let prompt = key(gate(true, true, true, true), 0.6, TargetPose::Right);
        assert_eq!(prompt, VoicePromptKey::Hold);
    }

    #[test]
    fn test_uniform_frames_from_estimator() {
        let estimator = SceneEstimator::new();
        let key_for = |v: u8| {
            let metrics = estimator.estimate(&FrameBuffer::solid(64, 64, (v, v, v), 1));
            let g = gate(true, metrics.exposure_ok, metrics.glare_ok, true);
            VoicePromptKey::derive(&g, &metrics, TargetPose::Front)
        };

        assert_eq!(key_for(51), VoicePromptKey::TooDark);
        assert_eq!(key_for(242), VoicePromptKey::TooBright);
        assert_eq!(key_for(153), VoicePromptKey::Hold);
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(VoicePromptKey::NoFace.as_str(), "no_face");
        assert_eq!(VoicePromptKey::TurnRight.to_string(), "turn_right");
    }
}
