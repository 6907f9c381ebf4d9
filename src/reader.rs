//! Random-access reading of AVIF stills and sequences.
//!
//! A [`SequenceReader`] owns one decoder for the lifetime of the opened
//! container. Seeking is lazy: it only records the target index, and
//! [`SequenceReader::load`] decodes that frame on first access. The most
//! recently decoded frame is cached, so repeated loads are free.

use std::borrow::Cow;

use tracing::{debug, instrument, trace};

use crate::binding::{BindingError, BindingErrorKind, CodecBinding, Direction, FrameDecoder};
use crate::config::DecoderConfig;
use crate::error::{AvifError, OutOfRange, Result};
use crate::info::{FrameInfo, SequenceInfo};
use crate::limits::ResourceLimits;
use crate::metadata::{ImageMetadata, SourceMetadata, reconcile_read};
use crate::output::DecodedFrame;
use crate::pixel::{PixelData, PixelLayout};
use crate::source::{SourceError, SourceImage};
use crate::validate::check_animation;

/// An opened AVIF container.
pub struct SequenceReader<D: FrameDecoder> {
    decoder: D,
    info: SequenceInfo,
    metadata: ImageMetadata,
    limits: ResourceLimits,
    current: u32,
    cached: Option<DecodedFrame>,
}

impl<D: FrameDecoder> SequenceReader<D> {
    /// Open `data` with a decoder config from
    /// [`validate_decode`](crate::validate_decode) for the same binding.
    ///
    /// Fails with [`AvifError::MalformedContainer`] if the binding cannot
    /// parse the container, or if it reports zero frames or a zero dimension.
    #[instrument(level = "debug", skip_all, fields(len = data.len(), codec = %config.codec()))]
    pub fn open<B>(
        binding: &B,
        data: &[u8],
        config: &DecoderConfig,
        limits: &ResourceLimits,
    ) -> Result<Self>
    where
        B: CodecBinding<Decoder = D> + ?Sized,
    {
        limits.check_file_size(data.len() as u64)?;

        let mut decoder = binding
            .open_decoder(data, config)
            .map_err(classify_container_error)?;
        let raw = decoder.info().map_err(classify_container_error)?;

        if raw.frame_count == 0 {
            return Err(AvifError::MalformedContainer(
                "container has no frames".into(),
            ));
        }
        check_animation(config.codec(), binding, Direction::Decode, raw.frame_count)?;
        if raw.width == 0 || raw.height == 0 {
            return Err(AvifError::MalformedContainer(format!(
                "invalid dimensions {}x{}",
                raw.width, raw.height
            )));
        }
        limits.check_sequence(raw.width, raw.height, raw.frame_count)?;

        let metadata = reconcile_read(&raw);
        let info = SequenceInfo::new(raw.width, raw.height, raw.layout)
            .with_frame_count(raw.frame_count)
            .with_orientation(metadata.orientation);
        debug!(
            width = info.width,
            height = info.height,
            frames = info.frame_count,
            layout = %info.layout,
            orientation = info.orientation.exif_value(),
            "opened AVIF container"
        );

        Ok(Self {
            decoder,
            info,
            metadata,
            limits: *limits,
            current: 0,
            cached: None,
        })
    }

    /// Shape of the sequence.
    pub fn info(&self) -> &SequenceInfo {
        &self.info
    }

    /// Reconciled ICC, EXIF, XMP and orientation.
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    pub fn frame_count(&self) -> u32 {
        self.info.frame_count
    }

    pub fn is_animated(&self) -> bool {
        self.info.is_animated()
    }

    /// The current frame index.
    pub fn tell(&self) -> u32 {
        self.current
    }

    /// Make `index` the current frame without decoding it.
    ///
    /// Seeking to the current index is a no-op and keeps any loaded frame.
    /// `index == frame_count` reports [`OutOfRange::EndOfSequence`]; any other
    /// out-of-range value reports [`OutOfRange::InvalidIndex`].
    pub fn seek(&mut self, index: i64) -> Result<()> {
        let frame_count = self.info.frame_count;
        if index == i64::from(frame_count) {
            return Err(AvifError::FrameOutOfRange {
                index,
                frame_count,
                reason: OutOfRange::EndOfSequence,
            });
        }
        let Some(target) = u32::try_from(index).ok().filter(|&i| i < frame_count) else {
            return Err(AvifError::FrameOutOfRange {
                index,
                frame_count,
                reason: OutOfRange::InvalidIndex,
            });
        };
        if target != self.current {
            trace!(from = self.current, to = target, "seek");
            self.current = target;
        }
        Ok(())
    }

    /// Whether the current frame has been decoded.
    pub fn is_loaded(&self) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|f| f.index() == self.current)
    }

    /// Decode the current frame, or return it from cache.
    pub fn load(&mut self) -> Result<&DecodedFrame> {
        let frame = match self.cached.take() {
            Some(frame) if frame.index() == self.current => frame,
            _ => self.decode_current()?,
        };
        Ok(self.cached.insert(frame))
    }

    /// Timing and metadata of the current frame, once it has been loaded.
    pub fn frame_info(&self) -> Option<FrameInfo> {
        self.cached
            .as_ref()
            .filter(|f| f.index() == self.current)
            .map(|f| FrameInfo::new(&self.metadata, f.timestamp_ms(), f.duration_ms()))
    }

    /// Iterate over every frame from the first, leaving the reader on the last
    /// frame visited.
    pub fn frames(&mut self) -> Frames<'_, D> {
        Frames {
            reader: self,
            next: 0,
        }
    }

    #[instrument(level = "trace", skip(self), fields(index = self.current))]
    fn decode_current(&mut self) -> Result<DecodedFrame> {
        let index = self.current;
        let data = self
            .decoder
            .decode_frame(index)
            .map_err(classify_frame_error)?;
        if data.timescale == 0 {
            return Err(AvifError::MalformedContainer(format!(
                "frame {index} has a zero timescale"
            )));
        }
        let timestamp_ms = ticks_to_ms(data.pts, data.timescale);
        let duration_ms = ticks_to_ms(data.duration, data.timescale);
        self.limits
            .check_duration(timestamp_ms.saturating_add(duration_ms))?;

        let (width, height, layout) = (self.info.width, self.info.height, self.info.layout);
        let pixels = PixelData::from_bytes(layout, width, height, &data.pixels).ok_or_else(|| {
            AvifError::MalformedContainer(format!(
                "frame {index} has {} bytes, expected {width}x{height} {layout}",
                data.pixels.len()
            ))
        })?;
        trace!(timestamp_ms, duration_ms, "decoded frame");
        Ok(DecodedFrame::new(pixels, index, timestamp_ms, duration_ms))
    }
}

impl<D: FrameDecoder> core::fmt::Debug for SequenceReader<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SequenceReader")
            .field("info", &self.info)
            .field("current", &self.current)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`SequenceReader::frames`].
pub struct Frames<'r, D: FrameDecoder> {
    reader: &'r mut SequenceReader<D>,
    next: u32,
}

impl<D: FrameDecoder> Iterator for Frames<'_, D> {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.reader.frame_count() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let frame = self
            .reader
            .seek(i64::from(index))
            .and_then(|()| self.reader.load().cloned());
        if frame.is_err() {
            self.next = self.reader.frame_count();
        }
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.reader.frame_count().saturating_sub(self.next) as usize;
        (0, Some(left))
    }
}

/// A decoded sequence can be re-encoded directly.
impl<D: FrameDecoder> SourceImage for SequenceReader<D> {
    fn frame_count(&self) -> u32 {
        self.info.frame_count
    }

    fn tell(&self) -> u32 {
        self.current
    }

    fn seek(&mut self, index: u32) -> core::result::Result<(), SourceError> {
        SequenceReader::seek(self, i64::from(index))?;
        Ok(())
    }

    fn width(&self) -> u32 {
        self.info.width
    }

    fn height(&self) -> u32 {
        self.info.height
    }

    fn native_layout(&self) -> Option<PixelLayout> {
        Some(self.info.layout)
    }

    fn has_alpha(&self) -> bool {
        self.info.has_alpha()
    }

    fn pixels(&mut self, layout: PixelLayout) -> core::result::Result<Cow<'_, [u8]>, SourceError> {
        let frame = self.load()?;
        let bytes = match layout {
            l if l == frame.layout() => frame.pixels().to_bytes(),
            PixelLayout::Rgb => PixelData::Rgb8(frame.pixels().to_rgb8()).to_bytes(),
            PixelLayout::Rgba => PixelData::Rgba8(frame.pixels().to_rgba8()).to_bytes(),
        };
        Ok(Cow::Owned(bytes))
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            icc_profile: self.metadata.icc_profile.clone(),
            exif: self.metadata.exif.clone(),
            xmp: self.metadata.xmp.clone(),
            adobe_xmp: None,
        }
    }
}

/// Timescale ticks to milliseconds, rounding ties to even.
fn ticks_to_ms(ticks: u64, timescale: u64) -> u64 {
    let scaled = u128::from(ticks) * 1000;
    let timescale = u128::from(timescale);
    let (q, r) = (scaled / timescale, scaled % timescale);
    let ms = match (2 * r).cmp(&timescale) {
        core::cmp::Ordering::Greater => q + 1,
        core::cmp::Ordering::Equal if q % 2 == 1 => q + 1,
        _ => q,
    };
    u64::try_from(ms).unwrap_or(u64::MAX)
}

fn classify_container_error(err: BindingError) -> AvifError {
    match err.kind {
        BindingErrorKind::InvalidData => AvifError::MalformedContainer(err.message),
        BindingErrorKind::Unsupported => AvifError::UnsupportedContainer(err.message),
        _ => AvifError::Codec(err),
    }
}

fn classify_frame_error(err: BindingError) -> AvifError {
    match err.kind {
        BindingErrorKind::InvalidData => AvifError::MalformedContainer(err.message),
        _ => AvifError::Codec(err),
    }
}
