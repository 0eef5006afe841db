//! Target pose sequence and per-pose yaw thresholds.

use serde::{Deserialize, Serialize};

/// Front pose requires `|yaw|` strictly below this, in degrees. Tunable.
pub const FRONT_MAX_YAW_DEG: f32 = 8.0;

/// Side poses require `|yaw|` strictly above this, in degrees. Tunable.
///
/// The band between the front and side limits satisfies neither, which keeps
/// the gate from flickering at the front boundary.
pub const SIDE_MIN_YAW_DEG: f32 = 12.0;

/// The head orientation the user is currently asked to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPose {
    /// Facing the camera.
    #[default]
    Front,
    /// Head turned to the left pose.
    Left,
    /// Head turned to the right pose.
    Right,
}

impl TargetPose {
    /// The pose that follows a capture. `Right` is terminal.
    pub fn next(self) -> Self {
        match self {
            TargetPose::Front => TargetPose::Left,
            TargetPose::Left | TargetPose::Right => TargetPose::Right,
        }
    }

    /// Position in the sequence, 0 for `Front`.
    pub fn ordinal(self) -> u8 {
        match self {
            TargetPose::Front => 0,
            TargetPose::Left => 1,
            TargetPose::Right => 2,
        }
    }

    /// Whether `yaw` (radians) matches this pose. Unknown yaw never does.
    pub fn angle_satisfied(self, yaw: Option<f32>) -> bool {
        let Some(yaw) = yaw else {
            return false;
        };
        let degrees = yaw.to_degrees();
        match self {
            TargetPose::Front => degrees.abs() < FRONT_MAX_YAW_DEG,
            TargetPose::Left => degrees > SIDE_MIN_YAW_DEG,
            TargetPose::Right => degrees < -SIDE_MIN_YAW_DEG,
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetPose::Front => "front",
            TargetPose::Left => "left",
            TargetPose::Right => "right",
        }
    }
}

impl std::fmt::Display for TargetPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sequence_is_forward_only() {
        assert_eq!(TargetPose::Front.next(), TargetPose::Left);
        assert_eq!(TargetPose::Left.next(), TargetPose::Right);
        assert_eq!(TargetPose::Right.next(), TargetPose::Right);
    }

    #[test]
    fn test_left_needs_more_than_twelve_degrees() {
        assert!(!TargetPose::Left.angle_satisfied(Some(0.15)));
        assert!(TargetPose::Left.angle_satisfied(Some(0.25)));
        assert!(!TargetPose::Left.angle_satisfied(Some(-0.25)));
    }

    #[test]
    fn test_right_mirrors_left() {
        assert!(TargetPose::Right.angle_satisfied(Some(-0.25)));
        assert!(!TargetPose::Right.angle_satisfied(Some(-0.15)));
        assert!(!TargetPose::Right.angle_satisfied(Some(0.25)));
    }

    #[test]
    fn test_front_window() {
        assert!(TargetPose::Front.angle_satisfied(Some(0.0)));
        assert!(TargetPose::Front.angle_satisfied(Some(-0.13)));
        assert!(!TargetPose::Front.angle_satisfied(Some(0.15)));
    }

    #[test]
    fn test_dead_zone_satisfies_nothing() {
        let yaw = Some(10f32.to_radians());
        assert!(!TargetPose::Front.angle_satisfied(yaw));
        assert!(!TargetPose::Left.angle_satisfied(yaw));
        assert!(!TargetPose::Right.angle_satisfied(yaw));
    }

    #[test]
    fn test_unknown_yaw_not_satisfied() {
        assert!(!TargetPose::Front.angle_satisfied(None));
        assert!(!TargetPose::Left.angle_satisfied(None));
    }

    proptest! {
        #[test]
        fn prop_captures_never_move_backward(n in 1usize..50) {
            let mut pose = TargetPose::Front;
            for i in 0..n {
                let next = pose.next();
                prop_assert!(next.ordinal() >= pose.ordinal());
                pose = next;
                if i >= 1 {
                    prop_assert_eq!(pose, TargetPose::Right);
                }
            }
        }
    }
}
