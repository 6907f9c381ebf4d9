//! Encoding host images into an AVIF still or sequence.
//!
//! [`encode_sequence`] is the one-call entry point: it validates parameters,
//! reconciles metadata, walks every frame of every source and hands them to
//! a [`SequenceWriter`]. Hosts that produce frames some other way can drive
//! a [`SequenceWriter`] directly.

use tracing::{debug, instrument, trace, warn};

use crate::binding::{CodecBinding, Direction, EncoderParams, FrameEncoder};
use crate::config::EncoderConfig;
use crate::error::{AvifError, Result};
use crate::limits::ResourceLimits;
use crate::metadata::{EncodeMetadata, reconcile_write};
use crate::output::{EncodeFrame, EncodeOutput};
use crate::params::{EncodeParams, FrameDurations};
use crate::pixel::PixelLayout;
use crate::source::SourceImage;
use crate::validate::{check_animation, validate_encode};

/// Shape of the sequence a [`SequenceWriter`] will produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencePlan {
    pub width: u32,
    pub height: u32,
    /// Frames across all sources. Exactly 1 produces a still image.
    pub total_frames: u32,
    pub durations: FrameDurations,
}

impl SequencePlan {
    pub fn new(width: u32, height: u32, total_frames: u32) -> Self {
        Self {
            width,
            height,
            total_frames,
            durations: FrameDurations::default(),
        }
    }

    pub fn with_durations(mut self, durations: FrameDurations) -> Self {
        self.durations = durations;
        self
    }

    pub fn is_single_frame(&self) -> bool {
        self.total_frames == 1
    }
}

/// Feeds frames of one size to an encoder.
pub struct SequenceWriter<E: FrameEncoder> {
    encoder: E,
    plan: SequencePlan,
    limits: ResourceLimits,
    frames_added: u32,
    elapsed_ms: u64,
}

impl<E: FrameEncoder> SequenceWriter<E> {
    /// Create the encoder. Limits on dimensions and frame count, and whether a
    /// named codec can encode sequences, are checked here before the binding
    /// creates anything.
    pub fn new<B>(
        binding: &B,
        config: &EncoderConfig,
        metadata: &EncodeMetadata,
        plan: SequencePlan,
        limits: &ResourceLimits,
    ) -> Result<Self>
    where
        B: CodecBinding<Encoder = E> + ?Sized,
    {
        if plan.total_frames == 0 {
            return Err(AvifError::EncodeFailure("no frames to write".into()));
        }
        limits.check_sequence(plan.width, plan.height, plan.total_frames)?;
        check_animation(config.codec(), binding, Direction::Encode, plan.total_frames)?;
        let encoder = binding.create_encoder(EncoderParams {
            width: plan.width,
            height: plan.height,
            config,
            metadata,
        })?;
        debug!(
            width = plan.width,
            height = plan.height,
            frames = plan.total_frames,
            still = plan.is_single_frame(),
            "created encoder"
        );
        Ok(Self {
            encoder,
            plan,
            limits: *limits,
            frames_added: 0,
            elapsed_ms: 0,
        })
    }

    /// Frames accepted so far.
    pub fn frames_added(&self) -> u32 {
        self.frames_added
    }

    /// Add the current frame of `source`.
    ///
    /// Sources stored as exactly RGB or RGBA are passed through. Anything else
    /// is converted to RGBA if it carries transparency and RGB otherwise.
    #[instrument(level = "trace", skip_all, fields(frame = self.frames_added))]
    pub fn add_frame<S: SourceImage + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        let layout = source
            .native_layout()
            .unwrap_or_else(|| PixelLayout::for_alpha(source.has_alpha()));
        let (width, height) = (source.width(), source.height());
        self.check_size(width, height)?;
        let pixels = source.pixels(layout).map_err(AvifError::Source)?;
        self.add_raw(&pixels, width, height, layout)
    }

    /// Add one frame of interleaved pixels.
    pub fn add_raw(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<()> {
        self.check_size(width, height)?;
        if layout.buffer_len(width, height) != Some(pixels.len()) {
            warn!(
                len = pixels.len(),
                width, height, %layout, "pixel buffer does not match frame size"
            );
            return Err(self.mismatch(width, height));
        }
        if self.frames_added >= self.plan.total_frames {
            return Err(AvifError::EncodeFailure(format!(
                "more than the {} planned frames",
                self.plan.total_frames
            )));
        }

        let duration = self.plan.durations.get(self.frames_added)?;
        let elapsed = self.elapsed_ms + u64::from(duration);
        self.limits.check_duration(elapsed)?;

        trace!(frame = self.frames_added, duration, %layout, "adding frame");
        self.encoder.add(EncodeFrame {
            pixels,
            duration,
            width,
            height,
            layout,
            is_single_frame: self.plan.is_single_frame(),
        })?;
        self.frames_added += 1;
        self.elapsed_ms = elapsed;
        Ok(())
    }

    /// Add every frame of `source` in order.
    ///
    /// Leaves `source` on its last frame; [`encode_sequence`] restores it.
    pub fn add_all<S: SourceImage + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        for index in 0..source.frame_count() {
            source.seek(index).map_err(AvifError::Source)?;
            self.add_frame(source)?;
        }
        Ok(())
    }

    /// Finalize the container.
    #[instrument(level = "debug", skip_all, fields(frames = self.frames_added))]
    pub fn finish(self) -> Result<EncodeOutput> {
        let data = match self.encoder.finish()? {
            Some(data) if !data.is_empty() => data,
            _ => {
                return Err(AvifError::EncodeFailure(
                    "encoder produced no output".into(),
                ));
            }
        };
        self.limits.check_output_size(data.len() as u64)?;
        debug!(bytes = data.len(), "finished encode");
        Ok(EncodeOutput::new(data, self.frames_added))
    }

    fn check_size(&self, width: u32, height: u32) -> Result<()> {
        if (width, height) == (self.plan.width, self.plan.height) {
            Ok(())
        } else {
            Err(self.mismatch(width, height))
        }
    }

    fn mismatch(&self, width: u32, height: u32) -> AvifError {
        AvifError::DimensionMismatch {
            expected_width: self.plan.width,
            expected_height: self.plan.height,
            width,
            height,
        }
    }
}

impl<E: FrameEncoder> core::fmt::Debug for SequenceWriter<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SequenceWriter")
            .field("plan", &self.plan)
            .field("frames_added", &self.frames_added)
            .field("elapsed_ms", &self.elapsed_ms)
            .finish_non_exhaustive()
    }
}

/// Encode `primary`, and with `save_all` every frame of it and of `append`.
///
/// Without `save_all` only the primary's first frame is written. The frame
/// total still counts every frame of every source, so a single frame taken
/// from an animation is not marked as a still. Parameters are validated
/// before the binding creates an encoder. Every source is returned to the
/// frame it was on, whether or not encoding succeeds. Nothing is returned
/// unless every frame was accepted.
#[instrument(level = "debug", skip_all, fields(save_all = save_all, appended = append.len()))]
pub fn encode_sequence<B: CodecBinding + ?Sized>(
    binding: &B,
    primary: &mut dyn SourceImage,
    append: &mut [&mut dyn SourceImage],
    params: &EncodeParams,
    save_all: bool,
    limits: &ResourceLimits,
) -> Result<EncodeOutput> {
    let config = validate_encode(params, binding)?;

    let total_frames = append
        .iter()
        .fold(primary.frame_count(), |n, s| n.saturating_add(s.frame_count()));
    let metadata = reconcile_write(params, &primary.metadata());
    let plan = SequencePlan::new(primary.width(), primary.height(), total_frames)
        .with_durations(params.duration.clone());
    let mut writer = SequenceWriter::new(binding, &config, &metadata, plan, limits)?;

    let positions: Vec<u32> = std::iter::once(primary.tell())
        .chain(append.iter().map(|s| s.tell()))
        .collect();
    let written = if save_all {
        add_sources(&mut writer, primary, append)
    } else {
        add_first_frame(&mut writer, primary)
    };
    let mut restored = restore_position(primary, positions[0]);
    for (source, &index) in append.iter_mut().zip(&positions[1..]) {
        restored = restored.and(restore_position(&mut **source, index));
    }
    written?;
    restored?;
    writer.finish()
}

fn add_first_frame<E: FrameEncoder>(
    writer: &mut SequenceWriter<E>,
    primary: &mut dyn SourceImage,
) -> Result<()> {
    primary.seek(0).map_err(AvifError::Source)?;
    writer.add_frame(primary)
}

fn add_sources<E: FrameEncoder>(
    writer: &mut SequenceWriter<E>,
    primary: &mut dyn SourceImage,
    append: &mut [&mut dyn SourceImage],
) -> Result<()> {
    writer.add_all(primary)?;
    for source in append.iter_mut() {
        writer.add_all(&mut **source)?;
    }
    Ok(())
}

fn restore_position<S: SourceImage + ?Sized>(source: &mut S, index: u32) -> Result<()> {
    if source.tell() != index {
        source.seek(index).map_err(AvifError::Source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecChoice;
    use crate::error::CodecRejection;
    use crate::exif;
    use crate::metadata::SourceMetadata;
    use crate::params::XmpInput;
    use crate::source::RawSequence;
    use crate::test_support::{MockBinding, MockContainer, PaletteSource, init_tracing};

    fn rgb(width: u32, height: u32, frames: &[u8]) -> RawSequence {
        let len = (width * height * 3) as usize;
        RawSequence::new(
            width,
            height,
            PixelLayout::Rgb,
            frames.iter().map(|&v| vec![v; len]).collect(),
        )
    }

    fn save_all(
        primary: &mut dyn SourceImage,
        append: &mut [&mut dyn SourceImage],
        params: &EncodeParams,
    ) -> Result<MockContainer> {
        let out = encode_sequence(
            &MockBinding::new(),
            primary,
            append,
            params,
            true,
            &ResourceLimits::none(),
        )?;
        Ok(MockContainer::parse(out.bytes()).unwrap())
    }

    #[test]
    fn writes_every_frame_with_durations() {
        init_tracing();
        let mut first = rgb(2, 2, &[1, 2]);
        let mut second = rgb(2, 2, &[3]);
        let params =
            EncodeParams::new().with_duration(FrameDurations::PerFrame(vec![10, 20, 30]));
        let c = save_all(&mut first, &mut [&mut second], &params).unwrap();
        let summary: Vec<_> = c
            .frames
            .iter()
            .map(|f| (f.pixels[0], f.duration, f.single))
            .collect();
        assert_eq!(summary, vec![(1, 10, false), (2, 20, false), (3, 30, false)]);
        assert_eq!(c.quality, 75);
    }

    #[test]
    fn dimension_mismatch_produces_nothing() {
        let mut first = rgb(4, 4, &[0]);
        let mut second = rgb(2, 2, &[0]);
        let err = save_all(&mut first, &mut [&mut second], &EncodeParams::new()).unwrap_err();
        assert!(matches!(
            err,
            AvifError::DimensionMismatch {
                expected_width: 4,
                width: 2,
                ..
            }
        ));
    }

    #[test]
    fn short_buffer_is_a_mismatch() {
        let mut bad = RawSequence::still(2, 2, PixelLayout::Rgb, vec![0; 11]);
        let err = save_all(&mut bad, &mut [], &EncodeParams::new()).unwrap_err();
        assert!(matches!(err, AvifError::DimensionMismatch { .. }));
    }

    #[test]
    fn duration_list_too_short() {
        let mut seq = rgb(1, 1, &[0, 1, 2]);
        let params = EncodeParams::new().with_duration(FrameDurations::PerFrame(vec![5, 5]));
        let err = save_all(&mut seq, &mut [], &params).unwrap_err();
        assert!(matches!(
            err,
            AvifError::MissingDuration {
                frame: 2,
                provided: 2
            }
        ));
        assert_eq!(seq.tell(), 0);
    }

    #[test]
    fn save_writes_first_frame_and_restores() {
        let mut seq = rgb(1, 1, &[7, 8, 9]);
        seq.seek(1).unwrap();
        let out = encode_sequence(
            &MockBinding::new(),
            &mut seq,
            &mut [],
            &EncodeParams::new(),
            false,
            &ResourceLimits::none(),
        )
        .unwrap();
        assert_eq!(out.frame_count(), 1);
        let c = MockContainer::parse(out.bytes()).unwrap();
        assert_eq!(c.frames.len(), 1);
        assert_eq!(c.frames[0].pixels, vec![7, 7, 7]);
        // Total counts all three frames, so this is not a still.
        assert!(!c.frames[0].single);
        assert_eq!(seq.tell(), 1);
    }

    #[test]
    fn save_of_a_still_is_single() {
        let mut seq = rgb(1, 1, &[5]);
        let out = encode_sequence(
            &MockBinding::new(),
            &mut seq,
            &mut [],
            &EncodeParams::new(),
            false,
            &ResourceLimits::none(),
        )
        .unwrap();
        assert_eq!(&out.bytes()[8..12], b"avif");
        assert!(MockContainer::parse(out.bytes()).unwrap().frames[0].single);
    }

    #[test]
    fn single_frame_save_all_is_still() {
        let mut seq = rgb(1, 1, &[4]);
        let c = save_all(&mut seq, &mut [], &EncodeParams::new()).unwrap();
        assert!(c.frames[0].single);
    }

    #[test]
    fn non_rgb_sources_pick_layout_from_transparency() {
        let mut opaque = PaletteSource::new(1, 1, 1);
        let c = save_all(&mut opaque, &mut [], &EncodeParams::new()).unwrap();
        assert_eq!(c.frames[0].layout, PixelLayout::Rgb);

        let mut clear = PaletteSource::new(1, 1, 1);
        clear.transparent = true;
        let c = save_all(&mut clear, &mut [], &EncodeParams::new()).unwrap();
        assert_eq!(c.frames[0].layout, PixelLayout::Rgba);
        assert_eq!(c.frames[0].pixels, vec![0, 0, 0, 128]);
    }

    #[test]
    fn positions_restored_after_failure() {
        let mut primary = PaletteSource::new(1, 1, 3);
        primary.current = 1;
        let mut other = PaletteSource::new(1, 1, 2);
        other.fail_on = Some(1);
        let err = save_all(&mut primary, &mut [&mut other], &EncodeParams::new()).unwrap_err();
        assert!(matches!(err, AvifError::Source(_)));
        assert_eq!(primary.current, 1);
        assert_eq!(other.current, 0);
    }

    #[test]
    fn validation_runs_before_encoder() {
        let mut seq = rgb(1, 1, &[0]);
        let err = save_all(&mut seq, &mut [], &EncodeParams::new().with_quality(101)).unwrap_err();
        assert!(matches!(err, AvifError::InvalidQuality(_)));
    }

    #[test]
    fn empty_output_is_a_failure() {
        let mut seq = rgb(1, 1, &[0]);
        let err = encode_sequence(
            &MockBinding::new().with_empty_output(),
            &mut seq,
            &mut [],
            &EncodeParams::new(),
            true,
            &ResourceLimits::none(),
        )
        .unwrap_err();
        assert!(matches!(err, AvifError::EncodeFailure(_)));
    }

    #[test]
    fn metadata_reaches_encoder() {
        let mut seq = rgb(1, 1, &[0]).with_metadata(
            SourceMetadata::default()
                .with_icc(vec![1, 2, 3])
                .with_adobe_xmp(b"<x/>".to_vec()),
        );
        let params = EncodeParams::new().with_exif(exif::minimal(6));
        let c = save_all(&mut seq, &mut [], &params).unwrap();
        assert_eq!(c.icc, vec![1, 2, 3]);
        assert_eq!(c.xmp, b"<x/>");
        assert_eq!(c.orientation, 6);

        let params = EncodeParams::new().with_xmp(XmpInput::Text("<y/>".into()));
        let c = save_all(&mut seq, &mut [], &params).unwrap();
        assert_eq!(c.xmp, b"<y/>");
        assert_eq!(c.orientation, 0);
    }

    #[test]
    fn limits_checked() {
        let mut seq = rgb(1, 1, &[0, 0, 0]);
        let params = EncodeParams::new().with_duration(FrameDurations::Uniform(100));
        let limits = ResourceLimits::none().with_max_duration(250);
        let err = encode_sequence(
            &MockBinding::new(),
            &mut seq,
            &mut [],
            &params,
            true,
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, AvifError::Limit(_)));

        let limits = ResourceLimits::none().with_max_output(4);
        let err = encode_sequence(
            &MockBinding::new(),
            &mut seq,
            &mut [],
            &params,
            true,
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, AvifError::Limit(_)));
    }

    #[test]
    fn still_only_codec_rejects_sequences() {
        let params = EncodeParams::new().with_codec(CodecChoice::named("svt"));
        let err = save_all(&mut rgb(1, 1, &[0, 1]), &mut [], &params).unwrap_err();
        assert!(matches!(
            err,
            AvifError::InvalidCodec {
                reason: CodecRejection::CannotEncodeAnimation,
                ..
            }
        ));
        let c = save_all(&mut rgb(1, 1, &[0]), &mut [], &params).unwrap();
        assert_eq!(c.codec, "svt");
    }

    #[test]
    fn writer_rejects_extra_frames() {
        let binding = MockBinding::new();
        let config = validate_encode(&EncodeParams::new(), &binding).unwrap();
        let mut writer = SequenceWriter::new(
            &binding,
            &config,
            &EncodeMetadata::default(),
            SequencePlan::new(1, 1, 1),
            &ResourceLimits::none(),
        )
        .unwrap();
        writer.add_raw(&[0, 0, 0], 1, 1, PixelLayout::Rgb).unwrap();
        assert!(writer.add_raw(&[0, 0, 0], 1, 1, PixelLayout::Rgb).is_err());
        assert_eq!(writer.frames_added(), 1);
        assert_eq!(writer.finish().unwrap().frame_count(), 1);
    }
}
