//! What the writer needs from a host image.
//!
//! Hosts implement [`SourceImage`] for their own image type. The writer only
//! asks for frame count, seeking, dimensions, pixels in a given layout and
//! native metadata. [`RawSequence`] is a ready-made implementation over
//! interleaved byte buffers.

use std::borrow::Cow;

use crate::metadata::SourceMetadata;
use crate::pixel::PixelLayout;

/// Error type hosts return from [`SourceImage`] methods.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// A single or multi-frame image the writer can encode.
pub trait SourceImage {
    /// Number of frames. Still images have one.
    fn frame_count(&self) -> u32 {
        1
    }

    /// Current frame index.
    fn tell(&self) -> u32 {
        0
    }

    /// Make `index` the current frame.
    fn seek(&mut self, index: u32) -> Result<(), SourceError>;

    /// Width of the current frame.
    fn width(&self) -> u32;

    /// Height of the current frame.
    fn height(&self) -> u32;

    /// The layout the current frame is stored in, when it is exactly RGB or RGBA.
    fn native_layout(&self) -> Option<PixelLayout>;

    /// Whether the current frame carries transparency in any form: an alpha
    /// channel, palette alpha or a transparent color key.
    fn has_alpha(&self) -> bool;

    /// Interleaved pixels of the current frame in `layout`.
    fn pixels(&mut self, layout: PixelLayout) -> Result<Cow<'_, [u8]>, SourceError>;

    /// ICC, EXIF and XMP the image carries.
    fn metadata(&self) -> SourceMetadata {
        SourceMetadata::default()
    }
}

/// Frames of equal size held as interleaved byte buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSequence {
    width: u32,
    height: u32,
    layout: PixelLayout,
    frames: Vec<Vec<u8>>,
    current: u32,
    metadata: SourceMetadata,
}

impl RawSequence {
    /// A sequence with one frame.
    pub fn still(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Self {
        Self::new(width, height, layout, vec![pixels])
    }

    /// A sequence of frames. Buffer lengths are checked when encoded.
    pub fn new(width: u32, height: u32, layout: PixelLayout, frames: Vec<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            layout,
            frames,
            current: 0,
            metadata: SourceMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }
}

impl SourceImage for RawSequence {
    fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    fn tell(&self) -> u32 {
        self.current
    }

    fn seek(&mut self, index: u32) -> Result<(), SourceError> {
        if index as usize >= self.frames.len() {
            return Err(format!("frame {index} out of range of {}", self.frames.len()).into());
        }
        self.current = index;
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn native_layout(&self) -> Option<PixelLayout> {
        Some(self.layout)
    }

    fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }

    fn pixels(&mut self, layout: PixelLayout) -> Result<Cow<'_, [u8]>, SourceError> {
        let frame = self
            .frames
            .get(self.current as usize)
            .ok_or("no current frame")?;
        Ok(match (self.layout, layout) {
            (from, to) if from == to => Cow::Borrowed(frame.as_slice()),
            (PixelLayout::Rgba, PixelLayout::Rgb) => Cow::Owned(
                frame
                    .chunks_exact(4)
                    .flat_map(|p| [p[0], p[1], p[2]])
                    .collect(),
            ),
            _ => Cow::Owned(
                frame
                    .chunks_exact(3)
                    .flat_map(|p| [p[0], p[1], p[2], 255])
                    .collect(),
            ),
        })
    }

    fn metadata(&self) -> SourceMetadata {
        self.metadata.clone()
    }
}
