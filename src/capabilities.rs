//! Codec capability descriptors.
//!
//! A codec binding reports a [`CodecCapabilities`] for every AV1 codec it can
//! reach (`aom`, `dav1d`, `rav1e`, `svt`, ...). Validation consults it before
//! any encoder or decoder is created.

use crate::binding::Direction;

/// Describes what one AV1 codec behind a binding supports.
///
/// Encode and decode availability are independent: `dav1d` typically
/// decodes only, `rav1e` encodes only, `aom` does both.
///
/// ```
/// use zenavif_seq::CodecCapabilities;
///
/// static DAV1D: CodecCapabilities = CodecCapabilities::new("dav1d")
///     .with_decode(true)
///     .with_decode_animation(true);
///
/// assert!(DAV1D.can_decode());
/// assert!(!DAV1D.can_encode());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct CodecCapabilities {
    name: &'static str,
    encode: bool,
    decode: bool,
    encode_animation: bool,
    decode_animation: bool,
    advanced_options: bool,
}

impl CodecCapabilities {
    /// Capabilities for `name` with everything disabled.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            encode: false,
            decode: false,
            encode_animation: false,
            decode_animation: false,
            advanced_options: false,
        }
    }

    /// The codec name as accepted by the `codec` option.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the codec can encode.
    pub const fn can_encode(&self) -> bool {
        self.encode
    }

    /// Whether the codec can decode.
    pub const fn can_decode(&self) -> bool {
        self.decode
    }

    /// Whether the codec works in the given direction.
    pub const fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Encode => self.encode,
            Direction::Decode => self.decode,
        }
    }

    /// Whether the encoder can produce image sequences.
    pub const fn encode_animation(&self) -> bool {
        self.encode_animation
    }

    /// Whether the decoder can read image sequences.
    pub const fn decode_animation(&self) -> bool {
        self.decode_animation
    }

    /// Whether the encoder accepts codec-specific key/value options.
    pub const fn advanced_options(&self) -> bool {
        self.advanced_options
    }

    /// Set encode support.
    pub const fn with_encode(mut self, v: bool) -> Self {
        self.encode = v;
        self
    }

    /// Set decode support.
    pub const fn with_decode(mut self, v: bool) -> Self {
        self.decode = v;
        self
    }

    /// Set image sequence encoding support.
    pub const fn with_encode_animation(mut self, v: bool) -> Self {
        self.encode_animation = v;
        self
    }

    /// Set image sequence decoding support.
    pub const fn with_decode_animation(mut self, v: bool) -> Self {
        self.decode_animation = v;
        self
    }

    /// Set codec-specific option support.
    pub const fn with_advanced_options(mut self, v: bool) -> Self {
        self.advanced_options = v;
        self
    }
}

impl core::fmt::Debug for CodecCapabilities {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodecCapabilities")
            .field("name", &self.name)
            .field("encode", &self.encode)
            .field("decode", &self.decode)
            .field("encode_animation", &self.encode_animation)
            .field("decode_animation", &self.decode_animation)
            .field("advanced_options", &self.advanced_options)
            .finish()
    }
}
