//! Face detection and head orientation.
//!
//! The detector itself is pluggable; this module turns its raw observations
//! into the geometry the gate and the overlay renderer consume.

use super::NormalizedPoint;
use crate::capture::FrameBuffer;
use std::time::Duration;
use thiserror::Error;

/// Forehead guide offset below the box top when landmarks are missing.
const FALLBACK_FOREHEAD_OFFSET: f32 = 0.02;
/// Chin guide offset above the box bottom when landmarks are missing.
const FALLBACK_CHIN_OFFSET: f32 = 0.02;
/// Nose guide position as a fraction of box height when landmarks are missing.
const FALLBACK_NOSE_FRACTION: f32 = 0.45;

/// Errors from a face detector. Always transient: the frame is skipped.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// The detector ran and failed.
    #[error("face detection failed: {0}")]
    DetectionFailed(String),
    /// The frame could not be handed to the detector.
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(String),
}

/// An axis-aligned rectangle in normalized view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width as a fraction of the view.
    pub width: f32,
    /// Height as a fraction of the view.
    pub height: f32,
}

impl NormalizedRect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area as a fraction of the view.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Landmark groups used for the region-of-interest guides.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceLandmarks {
    /// Outline of the face, forehead to chin.
    pub contour: Vec<NormalizedPoint>,
    /// Nose crest and nostril points.
    pub nose: Vec<NormalizedPoint>,
}

/// One face reported by a detector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceObservation {
    /// Face bounding box.
    pub bounds: NormalizedRect,
    /// Head yaw in radians. Positive values turn toward the `Left` pose.
    pub yaw: Option<f32>,
    /// Head roll in radians.
    pub roll: Option<f32>,
    /// Landmark points, when the detector provides them.
    pub landmarks: Option<FaceLandmarks>,
}

impl FaceObservation {
    /// A face with bounds and yaw only.
    pub fn with_yaw(bounds: NormalizedRect, yaw: f32) -> Self {
        Self {
            bounds,
            yaw: Some(yaw),
            ..Default::default()
        }
    }
}

/// How many faces are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacePresence {
    /// No face visible.
    #[default]
    None,
    /// Exactly one face.
    One,
    /// More than one face.
    Multiple,
}

impl FacePresence {
    /// Classifies a face count.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => FacePresence::None,
            1 => FacePresence::One,
            _ => FacePresence::Multiple,
        }
    }

    /// At least one face visible.
    pub fn any(self) -> bool {
        self != FacePresence::None
    }
}

/// Vertical guide lines drawn over the face (normalized y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideAnchors {
    /// Top of the forehead region.
    pub forehead: f32,
    /// Nose line.
    pub nose: f32,
    /// Bottom of the chin.
    pub chin: f32,
}

impl GuideAnchors {
    /// Derives anchors from landmarks, falling back to the box per anchor.
    pub fn for_face(face: &FaceObservation) -> Self {
        let fallback = Self::from_bounds(&face.bounds);
        let Some(landmarks) = &face.landmarks else {
            return fallback;
        };

        let contour_ys = landmarks.contour.iter().map(|p| p.y);
        let forehead = contour_ys.clone().reduce(f32::min).unwrap_or(fallback.forehead);
        let chin = contour_ys.reduce(f32::max).unwrap_or(fallback.chin);
        let nose = if landmarks.nose.is_empty() {
            fallback.nose
        } else {
            landmarks.nose.iter().map(|p| p.y).sum::<f32>() / landmarks.nose.len() as f32
        };

        Self {
            forehead,
            nose,
            chin,
        }
    }

    /// Approximates anchors from the bounding box alone.
    pub fn from_bounds(bounds: &NormalizedRect) -> Self {
        Self {
            forehead: bounds.y + FALLBACK_FOREHEAD_OFFSET,
            nose: bounds.y + bounds.height * FALLBACK_NOSE_FRACTION,
            chin: bounds.bottom() - FALLBACK_CHIN_OFFSET,
        }
    }
}

/// Face geometry published for one detector pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceGeometry {
    /// How many faces were seen.
    pub presence: FacePresence,
    /// Every visible face, in detector order.
    pub faces: Vec<FaceObservation>,
    /// Guides for the primary face, when exactly one is visible.
    pub guides: Option<GuideAnchors>,
    /// Sequence number of the analysed frame.
    pub sequence: u64,
}

impl FaceGeometry {
    /// Builds geometry from a detector's observations.
    pub fn from_observations(faces: Vec<FaceObservation>, sequence: u64) -> Self {
        let presence = FacePresence::from_count(faces.len());
        let guides = match presence {
            FacePresence::One => faces.first().map(GuideAnchors::for_face),
            _ => None,
        };

        Self {
            presence,
            faces,
            guides,
            sequence,
        }
    }

    /// Bounding boxes of every visible face.
    pub fn overlays(&self) -> Vec<NormalizedRect> {
        self.faces.iter().map(|f| f.bounds).collect()
    }

    /// The face, when exactly one is visible.
    pub fn primary(&self) -> Option<&FaceObservation> {
        match self.presence {
            FacePresence::One => self.faces.first(),
            _ => None,
        }
    }

    /// The face with the largest bounding box.
    pub fn largest(&self) -> Option<&FaceObservation> {
        self.faces
            .iter()
            .max_by(|a, b| a.bounds.area().total_cmp(&b.bounds.area()))
    }

    /// Yaw of the primary face, in radians.
    pub fn yaw(&self) -> Option<f32> {
        self.primary().and_then(|f| f.yaw)
    }

    /// Roll of the primary face, in radians.
    pub fn roll(&self) -> Option<f32> {
        self.primary().and_then(|f| f.roll)
    }
}

/// A face detector backend.
pub trait FaceDetector: Send {
    /// Detects faces in the frame.
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<FaceObservation>, DetectorError>;
}

/// Runs a detector and shapes its output into [`FaceGeometry`].
pub struct FaceGeometryEstimator {
    detector: Box<dyn FaceDetector>,
}

impl FaceGeometryEstimator {
    /// Wraps a detector.
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    /// Analyses one frame.
    pub fn estimate(&mut self, frame: &FrameBuffer) -> Result<FaceGeometry, DetectorError> {
        if !frame.is_valid() {
            return Err(DetectorError::UnsupportedFrame(format!(
                "{}x{} {:?} with {} bytes",
                frame.width(),
                frame.height(),
                frame.format(),
                frame.pixels().len()
            )));
        }
        let faces = self.detector.detect(frame)?;
        let geometry = FaceGeometry::from_observations(faces, frame.sequence());

        tracing::trace!(
            sequence = frame.sequence(),
            presence = ?geometry.presence,
            yaw = ?geometry.yaw(),
            "Face geometry"
        );

        Ok(geometry)
    }
}

/// One scripted detector response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Report these faces.
    Faces(Vec<FaceObservation>),
    /// Fail the pass.
    Fail,
}

/// Detector that replays a fixed script, looping at the end.
///
/// Used by the demonstration binary and tests in place of a vision model.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    steps: Vec<ScriptStep>,
    cursor: usize,
    latency: Duration,
}

impl ScriptedDetector {
    /// Replays `steps` in order, looping at the end.
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cursor: 0,
            latency: Duration::ZERO,
        }
    }

    /// Always reports the same single face.
    pub fn constant(face: FaceObservation) -> Self {
        Self::new(vec![ScriptStep::Faces(vec![face])])
    }

    /// Head turn sweep: `dwell` passes each at front, left and right.
    pub fn pose_sweep(dwell: usize, side_yaw: f32) -> Self {
        let bounds = NormalizedRect::new(0.3, 0.2, 0.4, 0.55);
        let mut steps = Vec::with_capacity(dwell * 3);
        for yaw in [0.0, side_yaw, -side_yaw] {
            for _ in 0..dwell {
                steps.push(ScriptStep::Faces(vec![FaceObservation::with_yaw(bounds, yaw)]));
            }
        }
        Self::new(steps)
    }

    /// Sleeps this long on every detection.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &FrameBuffer) -> Result<Vec<FaceObservation>, DetectorError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.steps.is_empty() {
            return Ok(Vec::new());
        }

        let step = self.steps[self.cursor % self.steps.len()].clone();
        self.cursor += 1;

        match step {
            ScriptStep::Faces(faces) => Ok(faces),
            ScriptStep::Fail => Err(DetectorError::DetectionFailed("scripted failure".into())),
        }
    }
}
