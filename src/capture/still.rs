//! Still images rendered from raw frames.

use super::FrameBuffer;
use chrono::{DateTime, Utc};

/// An RGB still image produced on demand from the most recent frame.
#[derive(Clone, PartialEq)]
pub struct StillImage {
    /// Packed RGB8 pixels, row-major.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Sequence number of the source frame.
    sequence: u64,
    /// Wall-clock time the still was rendered.
    captured_at: DateTime<Utc>,
}

impl StillImage {
    /// Renders a frame into an RGB still.
    ///
    /// With `mirror` set the image is flipped horizontally, matching the
    /// selfie-preview convention of a front-facing camera. Returns `None`
    /// for an empty frame or one whose buffer does not match its dimensions.
    pub fn from_frame(frame: &FrameBuffer, mirror: bool) -> Option<Self> {
        if !frame.is_valid() || frame.pixel_count() == 0 {
            tracing::warn!(?frame, "Cannot render still from malformed frame");
            return None;
        }

        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let mut pixels = Vec::with_capacity(width * height * 3);

        for y in 0..height {
            for x in 0..width {
                let src_x = if mirror { width - 1 - x } else { x };
                let (r, g, b) = frame.rgb_at(y * width + src_x);
                pixels.extend_from_slice(&[r, g, b]);
            }
        }

        Some(Self {
            pixels,
            width: frame.width(),
            height: frame.height(),
            sequence: frame.sequence(),
            captured_at: Utc::now(),
        })
    }

    /// Returns the packed RGB8 pixels.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sequence number of the frame this still was rendered from.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the still was rendered.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl std::fmt::Debug for StillImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
