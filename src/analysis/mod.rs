//! Per-frame scene and face analysis.
//!
//! Two estimators consume delivered frames: a cheap sampled pass for
//! exposure and glare that runs on every frame, and a face geometry pass
//! that runs behind a [`FrameThrottle`] because detection is expensive.

mod face;
mod scene;
mod throttle;

pub use face::{
    DetectorError, FaceDetector, FaceGeometry, FaceGeometryEstimator, FaceLandmarks,
    FaceObservation, FacePresence, GuideAnchors, NormalizedRect, ScriptStep, ScriptedDetector,
};
pub use scene::{
    NormalizedPoint, SceneEstimator, SceneMetrics, EXPOSURE_MAX, EXPOSURE_MIN, GLARE_CHANNEL_MIN,
    GLARE_RATIO_MAX, MAX_GLARE_POINTS, SAMPLE_BUDGET,
};
pub use throttle::FrameThrottle;
