//! Error types for AVIF sequence operations.

use thiserror::Error;

use crate::binding::BindingError;
use crate::limits::LimitExceeded;

/// Why a named codec was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecRejection {
    /// The binding does not know a codec by that name.
    UnknownCodec,
    /// The codec exists but cannot encode.
    CannotEncode,
    /// The codec exists but cannot decode.
    CannotDecode,
    /// The codec does not take advanced options.
    NoAdvancedOptions,
    /// The codec encodes stills only.
    CannotEncodeAnimation,
    /// The codec decodes stills only.
    CannotDecodeAnimation,
}

impl core::fmt::Display for CodecRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::UnknownCodec => "unknown codec",
            Self::CannotEncode => "codec is not capable of encoding",
            Self::CannotDecode => "codec is not capable of decoding",
            Self::NoAdvancedOptions => "codec does not accept advanced options",
            Self::CannotEncodeAnimation => "codec cannot encode image sequences",
            Self::CannotDecodeAnimation => "codec cannot decode image sequences",
        })
    }
}

/// Why a seek target was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutOfRange {
    /// The target is one past the last frame.
    EndOfSequence,
    /// The target is negative or further beyond the last frame.
    InvalidIndex,
}

/// Errors produced by validation, reading and writing.
///
/// Callers branch on the variant; messages are for humans only.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AvifError {
    /// Quality (or an explicit quantizer) is not an integer in range.
    #[error("invalid quality setting: {0}")]
    InvalidQuality(String),

    /// Chroma subsampling is not one of the supported modes.
    #[error("invalid subsampling: {0}")]
    InvalidSubsampling(String),

    /// YUV range is neither `full` nor `limited`.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Chroma upsampling mode is not recognized.
    #[error("invalid upsampling option: {0}")]
    InvalidUpsampling(String),

    /// A named codec is unknown or cannot work in the requested direction.
    #[error("invalid codec {name:?}: {reason}")]
    InvalidCodec {
        /// The requested codec name.
        name: String,
        /// Why it was rejected.
        reason: CodecRejection,
    },

    /// Advanced codec options have the wrong shape.
    #[error(
        "advanced codec options must be a map of key-value string pairs or a series of key-value two-tuples: {0}"
    )]
    InvalidAdvancedOptions(String),

    /// A frame's size differs from the first frame of the sequence.
    #[error("image sequence dimensions mismatch, {expected_width}x{expected_height} != {width}x{height}")]
    DimensionMismatch {
        /// Width of the first frame.
        expected_width: u32,
        /// Height of the first frame.
        expected_height: u32,
        /// Width of the offending frame.
        width: u32,
        /// Height of the offending frame.
        height: u32,
    },

    /// Frame durations are neither an integer nor a list of integers.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// A host option has the wrong type.
    #[error("invalid option {key:?}: {reason}")]
    InvalidOption {
        /// Option name.
        key: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A seek target lies outside the sequence.
    #[error("{}", out_of_range_message(.index, .frame_count, .reason))]
    FrameOutOfRange {
        /// Requested frame index.
        index: i64,
        /// Frames in the sequence.
        frame_count: u32,
        /// End of sequence or an invalid index.
        reason: OutOfRange,
    },

    /// A per-frame duration list ran out before the frames did.
    #[error("no duration for frame {frame}: {provided} durations provided")]
    MissingDuration {
        /// Zero-based index of the frame across all source images.
        frame: u32,
        /// Length of the duration list.
        provided: usize,
    },

    /// The container brand is AVIF but no codec binding is available.
    #[error("AVIF support not installed: {0}")]
    UnsupportedContainer(String),

    /// The container header is present but cannot be read.
    #[error("malformed AVIF container: {0}")]
    MalformedContainer(String),

    /// The binding produced no output.
    #[error("cannot write file as AVIF: {0}")]
    EncodeFailure(String),

    /// A host source image failed to seek or to produce pixels.
    #[error("source image error: {0}")]
    Source(#[source] crate::source::SourceError),

    /// A configured resource limit was exceeded.
    #[error(transparent)]
    Limit(#[from] LimitExceeded),

    /// Unclassified failure reported by the codec binding.
    #[error(transparent)]
    Codec(#[from] BindingError),
}

fn out_of_range_message(index: &i64, frame_count: &u32, reason: &OutOfRange) -> String {
    match reason {
        OutOfRange::EndOfSequence => format!("no more frames: sequence has {frame_count}"),
        OutOfRange::InvalidIndex => {
            format!("attempt to seek to frame {index} outside sequence of {frame_count}")
        }
    }
}

impl AvifError {
    pub(crate) fn invalid_codec(name: impl Into<String>, reason: CodecRejection) -> Self {
        Self::InvalidCodec {
            name: name.into(),
            reason,
        }
    }

    /// Whether this error came from parameter validation.
    ///
    /// Validation errors are always raised before the codec binding is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuality(_)
                | Self::InvalidSubsampling(_)
                | Self::InvalidRange(_)
                | Self::InvalidUpsampling(_)
                | Self::InvalidCodec { .. }
                | Self::InvalidAdvancedOptions(_)
                | Self::InvalidDuration(_)
                | Self::InvalidOption { .. }
        )
    }
}

/// Result type alias for AVIF sequence operations.
pub type Result<T> = core::result::Result<T, AvifError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_messages_differ() {
        let end = AvifError::FrameOutOfRange {
            index: 3,
            frame_count: 3,
            reason: OutOfRange::EndOfSequence,
        };
        let bad = AvifError::FrameOutOfRange {
            index: -1,
            frame_count: 3,
            reason: OutOfRange::InvalidIndex,
        };
        assert_eq!(end.to_string(), "no more frames: sequence has 3");
        assert_eq!(
            bad.to_string(),
            "attempt to seek to frame -1 outside sequence of 3"
        );
    }

    #[test]
    fn codec_message_names_reason() {
        let err = AvifError::invalid_codec("dav1d", CodecRejection::CannotEncode);
        assert_eq!(
            err.to_string(),
            "invalid codec \"dav1d\": codec is not capable of encoding"
        );
        let err = AvifError::invalid_codec("foo", CodecRejection::UnknownCodec);
        assert!(err.to_string().contains("unknown codec"));
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = AvifError::DimensionMismatch {
            expected_width: 128,
            expected_height: 128,
            width: 64,
            height: 64,
        };
        assert_eq!(
            err.to_string(),
            "image sequence dimensions mismatch, 128x128 != 64x64"
        );
    }

    #[test]
    fn validation_classification() {
        assert!(AvifError::InvalidQuality("x".into()).is_validation());
        assert!(AvifError::InvalidAdvancedOptions("x".into()).is_validation());
        assert!(!AvifError::EncodeFailure("x".into()).is_validation());
        assert!(!AvifError::MalformedContainer("x".into()).is_validation());
    }
}
