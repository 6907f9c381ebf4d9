//! Resolved encoder and decoder configuration.
//!
//! [`EncoderConfig`] and [`DecoderConfig`] are produced by validation and
//! lent to the codec binding unchanged. They cannot be built with
//! out-of-range values from outside the crate.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AvifError, Result};

/// Encoder ticks per second. Frame durations are in milliseconds.
pub const ENCODER_TIMESCALE: u64 = 1000;

/// Highest AV1 quantizer.
pub const MAX_QUANTIZER: u8 = 63;

/// Chroma subsampling of the encoded YUV planes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subsampling {
    #[serde(rename = "4:4:4")]
    Yuv444,
    #[serde(rename = "4:2:2")]
    Yuv422,
    #[default]
    #[serde(rename = "4:2:0")]
    Yuv420,
    /// Monochrome.
    #[serde(rename = "4:0:0")]
    Yuv400,
}

impl Subsampling {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yuv444 => "4:4:4",
            Self::Yuv422 => "4:2:2",
            Self::Yuv420 => "4:2:0",
            Self::Yuv400 => "4:0:0",
        }
    }
}

impl FromStr for Subsampling {
    type Err = AvifError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "4:4:4" => Ok(Self::Yuv444),
            "4:2:2" => Ok(Self::Yuv422),
            "4:2:0" => Ok(Self::Yuv420),
            "4:0:0" => Ok(Self::Yuv400),
            other => Err(AvifError::InvalidSubsampling(other.to_owned())),
        }
    }
}

/// Whether YUV samples use the full or the video (limited) range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YuvRange {
    #[default]
    Full,
    Limited,
}

impl YuvRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Limited => "limited",
        }
    }
}

impl FromStr for YuvRange {
    type Err = AvifError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(Self::Full),
            "limited" => Ok(Self::Limited),
            other => Err(AvifError::InvalidRange(other.to_owned())),
        }
    }
}

/// How the decoder upsamples subsampled chroma when converting to RGB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChromaUpsampling {
    /// Let the codec pick.
    #[default]
    Auto,
    /// Fastest available filter.
    Fastest,
    /// Best available filter.
    Best,
    Nearest,
    Bilinear,
}

impl ChromaUpsampling {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Fastest => "fastest",
            Self::Best => "best",
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
        }
    }
}

impl FromStr for ChromaUpsampling {
    type Err = AvifError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "fastest" => Ok(Self::Fastest),
            "best" => Ok(Self::Best),
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            other => Err(AvifError::InvalidUpsampling(other.to_owned())),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Subsampling, YuvRange, ChromaUpsampling);

/// Which AV1 codec the binding should use.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CodecChoice {
    /// Whatever the binding prefers.
    #[default]
    Auto,
    /// A specific codec by name (`aom`, `rav1e`, `dav1d`, ...).
    Named(String),
}

impl CodecChoice {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == "auto" {
            Self::Auto
        } else {
            Self::Named(name)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Auto => "auto",
            Self::Named(name) => name,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for CodecChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecChoice {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Ok(Self::named(s))
    }
}

/// Inclusive AV1 quantizer range. Lower is better quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuantizerRange {
    pub min: u8,
    pub max: u8,
}

impl QuantizerRange {
    /// Range derived from a 0-100 quality value.
    ///
    /// `min = clamp(64 - q, 0, 63)`, `max = clamp(100 - q, 0, 63)`.
    pub fn from_quality(quality: u8) -> Self {
        let q = i32::from(quality);
        let clamp = |v: i32| v.clamp(0, i32::from(MAX_QUANTIZER)) as u8;
        Self {
            min: clamp(64 - q),
            max: clamp(100 - q),
        }
    }

    /// Explicit range. Both ends must be 0-63 with `min <= max`.
    pub fn explicit(min: i64, max: i64) -> Result<Self> {
        let limit = i64::from(MAX_QUANTIZER);
        if !(0..=limit).contains(&min) || !(0..=limit).contains(&max) {
            return Err(AvifError::InvalidQuality(format!(
                "qmin and qmax must be between 0 and {limit}, got {min} and {max}"
            )));
        }
        if min > max {
            return Err(AvifError::InvalidQuality(format!(
                "qmin {min} is greater than qmax {max}"
            )));
        }
        Ok(Self {
            min: min as u8,
            max: max as u8,
        })
    }
}

/// Codec-specific key/value options, passed through in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvancedOptions(Vec<(String, String)>);

impl AdvancedOptions {
    /// Build from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Parse a JSON object of strings or a JSON array of two-string arrays.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        let bad = |what: &str| AvifError::InvalidAdvancedOptions(what.to_owned());
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    _ => Err(bad(&format!("value for {k:?} is not a string"))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self),
            Value::Array(items) => items
                .iter()
                .map(|item| match item.as_array().map(Vec::as_slice) {
                    Some([Value::String(k), Value::String(v)]) => Ok((k.clone(), v.clone())),
                    _ => Err(bad(&format!("{item} is not a two-element string array"))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self),
            other => Err(bad(&format!("got {other}"))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Fully validated encoder settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub(crate) quality: u8,
    pub(crate) quantizers: QuantizerRange,
    pub(crate) explicit_quantizers: bool,
    pub(crate) subsampling: Subsampling,
    pub(crate) speed: u8,
    pub(crate) max_threads: u32,
    pub(crate) codec: CodecChoice,
    pub(crate) range: YuvRange,
    pub(crate) tile_rows_log2: u8,
    pub(crate) tile_cols_log2: u8,
    pub(crate) autotiling: bool,
    pub(crate) alpha_premultiplied: bool,
    pub(crate) advanced: AdvancedOptions,
}

impl EncoderConfig {
    /// Quality 0-100.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Quantizer range, derived from quality unless set explicitly.
    pub fn quantizers(&self) -> QuantizerRange {
        self.quantizers
    }

    /// Whether [`quantizers`](Self::quantizers) came from an explicit qmin/qmax.
    pub fn has_explicit_quantizers(&self) -> bool {
        self.explicit_quantizers
    }

    pub fn subsampling(&self) -> Subsampling {
        self.subsampling
    }

    /// Encoder speed, 0 (slowest) to 10 (fastest).
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Resolved thread count, never 0.
    pub fn max_threads(&self) -> u32 {
        self.max_threads
    }

    pub fn codec(&self) -> &CodecChoice {
        &self.codec
    }

    pub fn range(&self) -> YuvRange {
        self.range
    }

    /// Tile rows as log2, 0-6. Ignored when autotiling.
    pub fn tile_rows_log2(&self) -> u8 {
        self.tile_rows_log2
    }

    /// Tile columns as log2, 0-6. Ignored when autotiling.
    pub fn tile_cols_log2(&self) -> u8 {
        self.tile_cols_log2
    }

    pub fn autotiling(&self) -> bool {
        self.autotiling
    }

    pub fn alpha_premultiplied(&self) -> bool {
        self.alpha_premultiplied
    }

    pub fn advanced(&self) -> &AdvancedOptions {
        &self.advanced
    }

    /// Ticks per second of frame durations handed to the encoder.
    pub fn timescale(&self) -> u64 {
        ENCODER_TIMESCALE
    }
}

/// Fully validated decoder settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    pub(crate) codec: CodecChoice,
    pub(crate) upsampling: ChromaUpsampling,
    pub(crate) max_threads: u32,
}

impl DecoderConfig {
    pub fn codec(&self) -> &CodecChoice {
        &self.codec
    }

    pub fn upsampling(&self) -> ChromaUpsampling {
        self.upsampling
    }

    /// Resolved thread count, never 0 once validated.
    pub fn max_threads(&self) -> u32 {
        self.max_threads
    }
}
