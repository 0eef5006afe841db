//! Raw frame buffer delivered by the frame source.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pixel layout of a raw frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit single channel luminance.
    Gray8,
    /// 8-bit packed red, green, blue.
    Rgb8,
    /// 8-bit packed red, green, blue, alpha.
    Rgba8,
    /// 8-bit packed blue, green, red, alpha (typical mobile camera output).
    Bgra8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }

    /// Reads one pixel as `(r, g, b)`.
    ///
    /// `px` must hold at least `bytes_per_pixel()` bytes.
    #[inline]
    pub fn rgb(self, px: &[u8]) -> (u8, u8, u8) {
        match self {
            PixelFormat::Gray8 => (px[0], px[0], px[0]),
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => (px[0], px[1], px[2]),
            PixelFormat::Bgra8 => (px[2], px[1], px[0]),
        }
    }
}

/// A single raw frame from the camera.
///
/// Consumers treat the buffer as read-only. The pipeline shares it behind an
/// `Arc` so the detector stage and the still-capture slot can hold it without
/// copying pixels.
#[derive(Clone)]
pub struct FrameBuffer {
    /// Raw pixel data laid out according to `format`.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Pixel layout.
    format: PixelFormat,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl FrameBuffer {
    /// Creates a new frame with the given parameters.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            format,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Creates a frame where every pixel has the same colour.
    pub fn solid(width: u32, height: u32, rgb: (u8, u8, u8), sequence: u64) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Self::new(pixels, width, height, PixelFormat::Rgb8, sequence)
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions and format.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * self.format.bytes_per_pixel()
    }

    /// Reads the pixel at linear index `i` as `(r, g, b)`.
    #[inline]
    pub fn rgb_at(&self, i: usize) -> (u8, u8, u8) {
        let bpp = self.format.bytes_per_pixel();
        self.format.rgb(&self.pixels[i * bpp..(i + 1) * bpp])
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = FrameBuffer::new(vec![0u8; 64 * 48 * 4], 64, 48, PixelFormat::Bgra8, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let frame = FrameBuffer::new(vec![0u8; 100], 64, 48, PixelFormat::Rgb8, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_bgra_channel_order() {
        let frame = FrameBuffer::new(vec![10, 20, 30, 255], 1, 1, PixelFormat::Bgra8, 0);
        assert_eq!(frame.rgb_at(0), (30, 20, 10));
    }

    #[test]
    fn test_solid_frame() {
        let frame = FrameBuffer::solid(4, 2, (1, 2, 3), 7);
        assert!(frame.is_valid());
        assert_eq!(frame.rgb_at(7), (1, 2, 3));
    }
}
