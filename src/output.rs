//! Frame and output types on both sides of the codec binding.

use imgref::{ImgRef, ImgVec};
use rgb::{Rgb, Rgba};

use crate::pixel::{PixelData, PixelLayout};

/// Encoded AVIF bytes returned by a writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOutput {
    data: Vec<u8>,
    frame_count: u32,
}

impl EncodeOutput {
    /// Create a new encode output.
    pub fn new(data: Vec<u8>, frame_count: u32) -> Self {
        Self { data, frame_count }
    }

    /// Consume and return the encoded bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Encoded byte count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the output is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Frames written.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

impl AsRef<[u8]> for EncodeOutput {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// A single frame materialized by a [`SequenceReader`](crate::SequenceReader).
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pixels: PixelData,
    index: u32,
    timestamp_ms: u64,
    duration_ms: u64,
}

impl DecodedFrame {
    /// Create a new decoded frame.
    pub fn new(pixels: PixelData, index: u32, timestamp_ms: u64, duration_ms: u64) -> Self {
        Self {
            pixels,
            index,
            timestamp_ms,
            duration_ms,
        }
    }

    /// Borrow the pixel data.
    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    /// Take the pixel data, consuming this frame.
    pub fn into_pixels(self) -> PixelData {
        self.pixels
    }

    /// Borrow as RGB8 if that's the native format.
    pub fn as_rgb8(&self) -> Option<ImgRef<'_, Rgb<u8>>> {
        match &self.pixels {
            PixelData::Rgb8(img) => Some(img.as_ref()),
            _ => None,
        }
    }

    /// Borrow as RGBA8 if that's the native format.
    pub fn as_rgba8(&self) -> Option<ImgRef<'_, Rgba<u8>>> {
        match &self.pixels {
            PixelData::Rgba8(img) => Some(img.as_ref()),
            _ => None,
        }
    }

    /// Convert to RGBA8.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        self.pixels.to_rgba8()
    }

    /// Frame index (0-based).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Presentation time in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Display duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Frame width.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Frame height.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Pixel layout.
    pub fn layout(&self) -> PixelLayout {
        self.pixels.layout()
    }
}

impl core::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("index", &self.index)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("layout", &self.layout())
            .field("timestamp_ms", &self.timestamp_ms)
            .field("duration_ms", &self.duration_ms)
            .finish()
    }
}

/// One frame handed to [`FrameEncoder::add`](crate::FrameEncoder::add).
#[derive(Clone, Copy)]
pub struct EncodeFrame<'a> {
    /// Interleaved pixels, exactly `width * height * layout.channels()` bytes.
    pub pixels: &'a [u8],
    /// Duration in encoder timescale ticks (milliseconds).
    pub duration: u32,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    /// Whether the whole output is a single still image.
    pub is_single_frame: bool,
}

impl core::fmt::Debug for EncodeFrame<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncodeFrame")
            .field("len", &self.pixels.len())
            .field("duration", &self.duration)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("is_single_frame", &self.is_single_frame)
            .finish()
    }
}
