//! Sequence and per-frame information surfaces.

use serde::{Deserialize, Serialize};

use crate::metadata::ImageMetadata;
use crate::orientation::Orientation;
use crate::pixel::PixelLayout;

/// Shape of an opened sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SequenceInfo {
    /// Frame width in pixels (stored, not display, orientation).
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of frames, at least 1.
    pub frame_count: u32,
    /// Layout decoded frames arrive in.
    pub layout: PixelLayout,
    /// Container orientation.
    pub orientation: Orientation,
}

impl SequenceInfo {
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            frame_count: 1,
            layout,
            orientation: Orientation::Normal,
        }
    }

    pub fn with_frame_count(mut self, count: u32) -> Self {
        self.frame_count = count;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// More than one frame.
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }

    pub fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }

    /// Dimensions after applying orientation for display.
    pub fn display_dimensions(&self) -> (u32, u32) {
        self.orientation.display_dimensions(self.width, self.height)
    }
}

/// Keyed information for the current frame, as hosts expect it.
///
/// Serializes to `icc_profile`, `exif`, `xmp`, `timestamp` and `duration`
/// (milliseconds). Absent metadata keys are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icc_profile: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmp: Option<Vec<u8>>,
    /// Presentation time in milliseconds.
    pub timestamp: u64,
    /// Display duration in milliseconds.
    pub duration: u64,
}

impl FrameInfo {
    /// Combine sequence metadata with one frame's timing.
    pub fn new(metadata: &ImageMetadata, timestamp: u64, duration: u64) -> Self {
        Self {
            icc_profile: metadata.icc_profile.clone(),
            exif: metadata.exif.clone(),
            xmp: metadata.xmp.clone(),
            timestamp,
            duration,
        }
    }
}
