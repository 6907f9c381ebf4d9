//! The seam between sequence orchestration and an AV1 codec library.
//!
//! A [`CodecBinding`] wraps whatever library actually produces and consumes
//! AV1 bitstreams (libavif, a pure-Rust decoder, ...). The reader and writer
//! in this crate never look inside a bitstream; they only call these traits.
//!
//! Bindings receive fully validated configuration. Anything they reject is
//! reported as a [`BindingError`], which the caller classifies.

use thiserror::Error;

use crate::config::{DecoderConfig, EncoderConfig};
use crate::metadata::EncodeMetadata;
use crate::output::EncodeFrame;
use crate::pixel::PixelLayout;
use crate::CodecCapabilities;

/// Which way a codec is being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Encode,
    Decode,
}

/// Entry point implemented by a codec library wrapper.
///
/// Decoders and encoders are owned values; dropping one releases every
/// resource it holds, including after a failed call.
pub trait CodecBinding {
    /// Decoder for one opened container.
    type Decoder: FrameDecoder;
    /// Encoder for one output container.
    type Encoder: FrameEncoder;

    /// Capabilities of the named codec, or `None` if the binding does not know it.
    fn codec_capabilities(&self, name: &str) -> Option<CodecCapabilities>;

    /// Open a container for decoding.
    fn open_decoder(
        &self,
        data: &[u8],
        config: &DecoderConfig,
    ) -> Result<Self::Decoder, BindingError>;

    /// Create an encoder for a sequence of `params.width` × `params.height` frames.
    fn create_encoder(&self, params: EncoderParams<'_>) -> Result<Self::Encoder, BindingError>;

    /// Whether the named codec is available for `direction`.
    fn codec_available(&self, name: &str, direction: Direction) -> bool {
        self.codec_capabilities(name)
            .is_some_and(|caps| caps.supports(direction))
    }
}

/// Per-container decode handle.
pub trait FrameDecoder {
    /// Container-level information. Called once per open.
    fn info(&mut self) -> Result<DecodeInfo, BindingError>;

    /// Decode the frame at `index` (0-based, already bounds-checked).
    fn decode_frame(&mut self, index: u32) -> Result<FrameData, BindingError>;
}

/// Per-output encode handle.
pub trait FrameEncoder {
    /// Append one frame.
    fn add(&mut self, frame: EncodeFrame<'_>) -> Result<(), BindingError>;

    /// Finalize the container. `None` means the codec produced nothing.
    fn finish(self) -> Result<Option<Vec<u8>>, BindingError>;
}

/// Everything an encoder needs at creation time.
#[derive(Clone, Copy, Debug)]
pub struct EncoderParams<'a> {
    pub width: u32,
    pub height: u32,
    pub config: &'a EncoderConfig,
    pub metadata: &'a EncodeMetadata,
}

/// Container-level information reported by a decoder.
///
/// Metadata fields are raw: the EXIF blob may disagree with `orientation`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// Layout frames will be decoded into.
    pub layout: PixelLayout,
    pub icc: Vec<u8>,
    pub exif: Vec<u8>,
    /// EXIF-style orientation derived from the container's `irot`/`imir`.
    pub orientation: u8,
    pub xmp: Vec<u8>,
}

/// One decoded frame with timing in container timescale ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameData {
    /// Interleaved pixels in the layout reported by [`DecodeInfo::layout`].
    pub pixels: Vec<u8>,
    /// Ticks per second.
    pub timescale: u64,
    /// Presentation time in ticks.
    pub pts: u64,
    /// Duration in ticks.
    pub duration: u64,
}

/// Broad category of a binding failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindingErrorKind {
    /// The input bytes are not a readable container or bitstream.
    InvalidData,
    /// A parameter was rejected by the codec.
    InvalidArgument,
    /// The container uses a feature the binding cannot handle.
    Unsupported,
    /// Anything else.
    Other,
}

/// Error reported by a codec binding.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct BindingError {
    pub kind: BindingErrorKind,
    pub message: String,
}

impl BindingError {
    pub fn new(kind: BindingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(BindingErrorKind::InvalidData, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(BindingErrorKind::Unsupported, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BindingErrorKind::Other, message)
    }
}
