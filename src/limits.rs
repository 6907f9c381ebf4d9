//! Resource limits for sequence reading and writing.
//!
//! [`ResourceLimits`] caps what a reader or writer will accept. Checks run
//! before the codec binding is asked to decode or encode any pixels.

use thiserror::Error;

/// Resource limits for AVIF sequence operations.
///
/// All fields are optional; `None` means no limit for that resource.
///
/// ```
/// use zenavif_seq::ResourceLimits;
///
/// let limits = ResourceLimits::none()
///     .with_max_pixels(100_000_000)
///     .with_max_frames(500);
/// assert!(limits.has_any());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ResourceLimits {
    /// Maximum total pixels per frame (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum frame width in pixels.
    pub max_width: Option<u32>,
    /// Maximum frame height in pixels.
    pub max_height: Option<u32>,
    /// Maximum container size in bytes (read only).
    pub max_file_size: Option<u64>,
    /// Maximum encoded output size in bytes (write only).
    pub max_output_bytes: Option<u64>,
    /// Maximum number of frames in a sequence.
    pub max_frames: Option<u32>,
    /// Maximum total sequence duration in milliseconds.
    pub max_duration_ms: Option<u64>,
}

impl ResourceLimits {
    /// No limits (all fields `None`).
    pub fn none() -> Self {
        Self::default()
    }

    /// Set maximum total pixels per frame.
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    /// Set maximum frame width in pixels.
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Set maximum frame height in pixels.
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Set maximum container size in bytes.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set maximum encoded output size in bytes.
    pub fn with_max_output(mut self, bytes: u64) -> Self {
        self.max_output_bytes = Some(bytes);
        self
    }

    /// Set maximum number of frames.
    pub fn with_max_frames(mut self, frames: u32) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Set maximum total duration in milliseconds.
    pub fn with_max_duration(mut self, ms: u64) -> Self {
        self.max_duration_ms = Some(ms);
        self
    }

    /// Whether any limits are set.
    pub fn has_any(&self) -> bool {
        self.max_pixels.is_some()
            || self.max_width.is_some()
            || self.max_height.is_some()
            || self.max_file_size.is_some()
            || self.max_output_bytes.is_some()
            || self.max_frames.is_some()
            || self.max_duration_ms.is_some()
    }

    /// Check frame dimensions against `max_width`, `max_height`, and `max_pixels`.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        if let Some(max) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > max {
                return Err(LimitExceeded::Pixels {
                    actual: pixels,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Check container size against `max_file_size`.
    pub fn check_file_size(&self, bytes: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_file_size
            && bytes > max
        {
            return Err(LimitExceeded::FileSize { actual: bytes, max });
        }
        Ok(())
    }

    /// Check encoded output size against `max_output_bytes`.
    pub fn check_output_size(&self, bytes: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_output_bytes
            && bytes > max
        {
            return Err(LimitExceeded::OutputSize { actual: bytes, max });
        }
        Ok(())
    }

    /// Check frame count against `max_frames`.
    pub fn check_frames(&self, count: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_frames
            && count > max
        {
            return Err(LimitExceeded::Frames { actual: count, max });
        }
        Ok(())
    }

    /// Check accumulated duration against `max_duration_ms`.
    pub fn check_duration(&self, ms: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_duration_ms
            && ms > max
        {
            return Err(LimitExceeded::Duration { actual: ms, max });
        }
        Ok(())
    }

    /// Check the shape of a whole sequence: dimensions and frame count.
    pub fn check_sequence(
        &self,
        width: u32,
        height: u32,
        frame_count: u32,
    ) -> Result<(), LimitExceeded> {
        self.check_dimensions(width, height)?;
        self.check_frames(frame_count)
    }
}

/// A resource limit was exceeded.
///
/// Each variant carries the actual value and the limit that was exceeded.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitExceeded {
    /// Frame width exceeded `max_width`.
    #[error("width {actual} exceeds limit {max}")]
    Width {
        /// Actual width.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Frame height exceeded `max_height`.
    #[error("height {actual} exceeds limit {max}")]
    Height {
        /// Actual height.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Pixel count exceeded `max_pixels`.
    #[error("pixel count {actual} exceeds limit {max}")]
    Pixels {
        /// Actual pixel count.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
    /// Container size exceeded `max_file_size`.
    #[error("file size {actual} bytes exceeds limit {max}")]
    FileSize {
        /// Actual size in bytes.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
    /// Encoded output exceeded `max_output_bytes`.
    #[error("output size {actual} bytes exceeds limit {max}")]
    OutputSize {
        /// Actual output size in bytes.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
    /// Frame count exceeded `max_frames`.
    #[error("frame count {actual} exceeds limit {max}")]
    Frames {
        /// Actual frame count.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Sequence duration exceeded `max_duration_ms`.
    #[error("duration {actual}ms exceeds limit {max}ms")]
    Duration {
        /// Actual duration in milliseconds.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
}
