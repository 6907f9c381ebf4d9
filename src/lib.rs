//! AVIF still and animated sequence support over a pluggable AV1 codec.
//!
//! This crate owns everything between a host image library and an AV1 codec
//! library: option validation, metadata reconciliation, frame sequencing and
//! timing, and container sniffing. The codec itself sits behind
//! [`CodecBinding`].
//!
//! - [`AvifFormat`]: identify, open and save, the way a host registers a format
//! - [`SequenceReader`]: lazy, seekable decoding with a one-frame cache
//! - [`SequenceWriter`] / [`encode_sequence`]: multi-source encoding
//! - [`EncodeParams`] / [`DecodeParams`] and their validated
//!   [`EncoderConfig`] / [`DecoderConfig`]
//! - [`ImageMetadata`] / [`Orientation`]: ICC, EXIF, XMP and orientation
//! - [`ResourceLimits`]: caps on dimensions, frames, durations and sizes
//!
//! ```no_run
//! use zenavif_seq::{AvifFormat, CodecBinding, DecodeParams};
//!
//! fn first_frame_size<B: CodecBinding>(binding: B, data: &[u8]) -> zenavif_seq::Result<(u32, u32)> {
//!     let avif = AvifFormat::new(Some(binding)).with_decode_params(DecodeParams::new());
//!     let mut reader = avif.open(data)?;
//!     let frame = reader.load()?;
//!     Ok((frame.width(), frame.height()))
//! }
//! ```

#![forbid(unsafe_code)]

mod binding;
mod capabilities;
mod config;
mod error;
pub mod exif;
mod info;
mod limits;
mod metadata;
mod orientation;
mod output;
mod params;
mod pixel;
mod plugin;
mod reader;
mod sniff;
mod source;
mod validate;
mod writer;

#[cfg(test)]
mod test_support;

pub use binding::{
    BindingError, BindingErrorKind, CodecBinding, DecodeInfo, Direction, EncoderParams, FrameData,
    FrameDecoder, FrameEncoder,
};
pub use capabilities::CodecCapabilities;
pub use config::{
    AdvancedOptions, ChromaUpsampling, CodecChoice, DecoderConfig, ENCODER_TIMESCALE,
    EncoderConfig, MAX_QUANTIZER, QuantizerRange, Subsampling, YuvRange,
};
pub use error::{AvifError, CodecRejection, OutOfRange, Result};
pub use info::{FrameInfo, SequenceInfo};
pub use limits::{LimitExceeded, ResourceLimits};
pub use metadata::{EncodeMetadata, ImageMetadata, SourceMetadata, reconcile_read, reconcile_write};
pub use orientation::{ContainerTransform, MirrorAxis, Orientation};
pub use output::{DecodedFrame, EncodeFrame, EncodeOutput};
pub use params::{DEFAULT_QUALITY, DEFAULT_SPEED, DecodeParams, EncodeParams, FrameDurations, XmpInput};
pub use pixel::{PixelData, PixelLayout};
pub use plugin::{AVIF, AvifFormat, FormatDescriptor};
pub use reader::{Frames, SequenceReader};
pub use sniff::{Brand, SNIFF_LEN, Sniff, sniff};
pub use source::{RawSequence, SourceError, SourceImage};
pub use validate::{
    AOM_MAX_THREADS, MAX_TILES_LOG2, SPEED_FASTEST, SPEED_SLOWEST, validate_decode,
    validate_encode,
};
pub use writer::{SequencePlan, SequenceWriter, encode_sequence};

// Re-exports for binding implementors and users.
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::{Rgb, Rgba};
