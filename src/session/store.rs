//! Ordered list of accepted captures.

use crate::capture::StillImage;
use crate::gate::TargetPose;

/// A still accepted by the session, with the pose it was taken for.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    /// The still.
    pub image: StillImage,
    /// Pose it was captured for.
    pub pose: TargetPose,
}

/// Append-only capture list with undo of the last entry.
#[derive(Debug, Clone, Default)]
pub struct CaptureStore {
    images: Vec<CapturedImage>,
}

impl CaptureStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends unconditionally; the gate has already decided.
    pub fn append(&mut self, image: CapturedImage) {
        self.images.push(image);
    }

    /// Removes the newest capture. No-op when empty.
    pub fn remove_last(&mut self) -> Option<CapturedImage> {
        self.images.pop()
    }

    /// Number of captures.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Captures in order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CapturedImage> {
        self.images.iter()
    }

    /// Copies of the first `n` stills in capture order.
    pub fn first_stills(&self, n: usize) -> Vec<StillImage> {
        self.images.iter().take(n).map(|c| c.image.clone()).collect()
    }
}
