//! In-memory codec binding and host images for unit tests.
//!
//! The mock "container" is a 12-byte `ftyp` header followed by a JSON body
//! holding raw frames, so round trips are exact and readable in failures.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::binding::{
    BindingError, CodecBinding, DecodeInfo, EncoderParams, FrameData, FrameDecoder, FrameEncoder,
};
use crate::capabilities::CodecCapabilities;
use crate::config::{DecoderConfig, ENCODER_TIMESCALE};
use crate::metadata::SourceMetadata;
use crate::output::EncodeFrame;
use crate::pixel::PixelLayout;
use crate::source::{SourceError, SourceImage};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug)]
pub(crate) struct MockBinding {
    codecs: Vec<CodecCapabilities>,
    empty_output: bool,
}

impl MockBinding {
    /// aom encodes and decodes, rav1e only encodes, dav1d only decodes.
    /// svt and libgav1 handle stills only, and only aom takes advanced options.
    pub(crate) fn new() -> Self {
        Self {
            codecs: vec![
                CodecCapabilities::new("aom")
                    .with_encode(true)
                    .with_decode(true)
                    .with_encode_animation(true)
                    .with_decode_animation(true)
                    .with_advanced_options(true),
                CodecCapabilities::new("rav1e")
                    .with_encode(true)
                    .with_encode_animation(true),
                CodecCapabilities::new("dav1d")
                    .with_decode(true)
                    .with_decode_animation(true),
                CodecCapabilities::new("svt").with_encode(true),
                CodecCapabilities::new("libgav1").with_decode(true),
            ],
            empty_output: false,
        }
    }

    pub(crate) fn without_aom() -> Self {
        let mut binding = Self::new();
        binding.codecs.retain(|c| c.name() != "aom");
        binding
    }

    /// Encoders finish without producing bytes.
    pub(crate) fn with_empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MockContainer {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub max_threads: u32,
    pub codec: String,
    pub frames: Vec<MockFrame>,
    pub icc: Vec<u8>,
    pub exif: Vec<u8>,
    pub xmp: Vec<u8>,
    pub orientation: u8,
    /// Ticks per second for frame durations. `0` means [`ENCODER_TIMESCALE`].
    #[serde(default)]
    pub timescale: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MockFrame {
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
    pub duration: u32,
    pub single: bool,
}

impl MockContainer {
    pub(crate) fn parse(data: &[u8]) -> Result<Self, BindingError> {
        if data.len() < 12 || &data[4..8] != b"ftyp" {
            return Err(BindingError::invalid_data("missing ftyp box"));
        }
        serde_json::from_slice(&data[12..]).map_err(|e| BindingError::invalid_data(e.to_string()))
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let brand: &[u8; 4] = if self.frames.len() > 1 {
            b"avis"
        } else {
            b"avif"
        };
        let mut out = vec![0, 0, 0, 12];
        out.extend_from_slice(b"ftyp");
        out.extend_from_slice(brand);
        out.extend(serde_json::to_vec(self).unwrap_or_default());
        out
    }
}

pub(crate) struct MockEncoder {
    container: MockContainer,
    empty_output: bool,
}

impl FrameEncoder for MockEncoder {
    fn add(&mut self, frame: EncodeFrame<'_>) -> Result<(), BindingError> {
        if frame.width != self.container.width || frame.height != self.container.height {
            return Err(BindingError::new(
                crate::binding::BindingErrorKind::InvalidArgument,
                "frame size changed",
            ));
        }
        self.container.frames.push(MockFrame {
            layout: frame.layout,
            pixels: frame.pixels.to_vec(),
            duration: frame.duration,
            single: frame.is_single_frame,
        });
        Ok(())
    }

    fn finish(self) -> Result<Option<Vec<u8>>, BindingError> {
        if self.empty_output {
            return Ok(None);
        }
        Ok(Some(self.container.to_bytes()))
    }
}

pub(crate) struct MockDecoder {
    container: MockContainer,
}

impl FrameDecoder for MockDecoder {
    fn info(&mut self) -> Result<DecodeInfo, BindingError> {
        let c = &self.container;
        Ok(DecodeInfo {
            width: c.width,
            height: c.height,
            frame_count: c.frames.len() as u32,
            layout: c.frames.first().map(|f| f.layout).unwrap_or_default(),
            icc: c.icc.clone(),
            exif: c.exif.clone(),
            orientation: if c.orientation == 0 { 1 } else { c.orientation },
            xmp: c.xmp.clone(),
        })
    }

    fn decode_frame(&mut self, index: u32) -> Result<FrameData, BindingError> {
        let frames = &self.container.frames;
        let frame = frames
            .get(index as usize)
            .ok_or_else(|| BindingError::other("index past end"))?;
        let pts = frames[..index as usize]
            .iter()
            .map(|f| u64::from(f.duration))
            .sum();
        let timescale = match self.container.timescale {
            0 => ENCODER_TIMESCALE,
            ts => ts,
        };
        Ok(FrameData {
            pixels: frame.pixels.clone(),
            timescale,
            pts,
            duration: u64::from(frame.duration),
        })
    }
}

impl CodecBinding for MockBinding {
    type Decoder = MockDecoder;
    type Encoder = MockEncoder;

    fn codec_capabilities(&self, name: &str) -> Option<CodecCapabilities> {
        self.codecs.iter().copied().find(|c| c.name() == name)
    }

    fn open_decoder(
        &self,
        data: &[u8],
        _config: &DecoderConfig,
    ) -> Result<MockDecoder, BindingError> {
        Ok(MockDecoder {
            container: MockContainer::parse(data)?,
        })
    }

    fn create_encoder(&self, params: EncoderParams<'_>) -> Result<MockEncoder, BindingError> {
        Ok(MockEncoder {
            container: MockContainer {
                width: params.width,
                height: params.height,
                quality: params.config.quality(),
                max_threads: params.config.max_threads(),
                codec: params.config.codec().to_string(),
                frames: Vec::new(),
                icc: params.metadata.icc.clone(),
                exif: params.metadata.exif.clone(),
                xmp: params.metadata.xmp.clone(),
                orientation: params.metadata.orientation,
                timescale: ENCODER_TIMESCALE,
            },
            empty_output: self.empty_output,
        })
    }
}

/// A host image with no RGB/RGBA storage, like a palette image.
///
/// Every pixel of frame `i` has all color channels set to `i`.
#[derive(Clone, Debug)]
pub(crate) struct PaletteSource {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub current: u32,
    pub transparent: bool,
    pub fail_on: Option<u32>,
    pub metadata: SourceMetadata,
}

impl PaletteSource {
    pub(crate) fn new(width: u32, height: u32, frames: u32) -> Self {
        Self {
            width,
            height,
            frames,
            current: 0,
            transparent: false,
            fail_on: None,
            metadata: SourceMetadata::default(),
        }
    }
}

impl SourceImage for PaletteSource {
    fn frame_count(&self) -> u32 {
        self.frames
    }

    fn tell(&self) -> u32 {
        self.current
    }

    fn seek(&mut self, index: u32) -> Result<(), SourceError> {
        if index >= self.frames {
            return Err("seek past end".into());
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
        None
    }

    fn has_alpha(&self) -> bool {
        self.transparent
    }

    fn pixels(&mut self, layout: PixelLayout) -> Result<Cow<'_, [u8]>, SourceError> {
        if self.fail_on == Some(self.current) {
            return Err(format!("cannot convert frame {}", self.current).into());
        }
        let value = self.current as u8;
        let pixel: &[u8] = match layout {
            PixelLayout::Rgb => &[value, value, value],
            PixelLayout::Rgba => &[value, value, value, 128],
        };
        let count = (self.width * self.height) as usize;
        Ok(Cow::Owned(pixel.repeat(count)))
    }

    fn metadata(&self) -> SourceMetadata {
        self.metadata.clone()
    }
}
