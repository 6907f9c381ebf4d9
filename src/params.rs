//! Caller-facing encode and decode parameters.
//!
//! These are the unvalidated inputs. [`validate`](crate::validate) turns them
//! into [`EncoderConfig`](crate::EncoderConfig) and
//! [`DecoderConfig`](crate::DecoderConfig).
//!
//! Hosts that carry options as loosely typed maps can use
//! [`EncodeParams::from_json`] and [`DecodeParams::from_json`], which apply
//! the same rules and report type mismatches with the matching error variant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::config::{AdvancedOptions, ChromaUpsampling, CodecChoice, Subsampling, YuvRange};
use crate::error::{AvifError, Result};

/// Default encode quality.
pub const DEFAULT_QUALITY: i64 = 75;

/// Default encoder speed.
pub const DEFAULT_SPEED: i64 = 6;

/// Frame durations in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameDurations {
    /// Same duration for every frame.
    Uniform(u32),
    /// One entry per frame across all source images, in order.
    PerFrame(Vec<u32>),
}

impl Default for FrameDurations {
    fn default() -> Self {
        Self::Uniform(0)
    }
}

impl FrameDurations {
    /// Duration of the frame at running index `frame`.
    pub fn get(&self, frame: u32) -> Result<u32> {
        match self {
            Self::Uniform(d) => Ok(*d),
            Self::PerFrame(list) => {
                list.get(frame as usize)
                    .copied()
                    .ok_or(AvifError::MissingDuration {
                        frame,
                        provided: list.len(),
                    })
            }
        }
    }
}

/// XMP as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XmpInput {
    /// XML text, stored as UTF-8.
    Text(String),
    /// Already-encoded packet.
    Bytes(Vec<u8>),
}

impl XmpInput {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.into_bytes(),
            Self::Bytes(b) => b,
        }
    }
}

/// Parameters for writing an AVIF image or sequence.
///
/// Integer fields are wide so that out-of-range requests can be reported
/// instead of silently truncated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct EncodeParams {
    /// 0 (worst) to 100 (lossless quantizers).
    pub quality: i64,
    /// Explicit minimum quantizer. Used only together with `qmax`.
    pub qmin: Option<i64>,
    /// Explicit maximum quantizer. Used only together with `qmin`.
    pub qmax: Option<i64>,
    pub subsampling: Subsampling,
    /// Clamped to 0-10.
    pub speed: i64,
    /// 0 means one thread per available CPU.
    pub max_threads: u32,
    pub codec: CodecChoice,
    pub range: YuvRange,
    /// Clamped to 0-6.
    pub tile_rows_log2: i64,
    /// Clamped to 0-6.
    pub tile_cols_log2: i64,
    pub alpha_premultiplied: bool,
    /// `None` enables autotiling when both tile parameters are 0.
    pub autotiling: Option<bool>,
    pub advanced: AdvancedOptions,
    pub duration: FrameDurations,
    /// Overrides the source image's ICC profile.
    pub icc_profile: Option<Vec<u8>>,
    /// Overrides the source image's EXIF.
    pub exif: Option<Vec<u8>>,
    /// Overrides the source image's XMP.
    pub xmp: Option<XmpInput>,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            qmin: None,
            qmax: None,
            subsampling: Subsampling::default(),
            speed: DEFAULT_SPEED,
            max_threads: 0,
            codec: CodecChoice::Auto,
            range: YuvRange::default(),
            tile_rows_log2: 0,
            tile_cols_log2: 0,
            alpha_premultiplied: false,
            autotiling: None,
            advanced: AdvancedOptions::default(),
            duration: FrameDurations::default(),
            icc_profile: None,
            exif: None,
            xmp: None,
        }
    }
}

impl EncodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = quality;
        self
    }

    /// Set an explicit quantizer range, overriding the one derived from quality.
    pub fn with_quantizers(mut self, qmin: i64, qmax: i64) -> Self {
        self.qmin = Some(qmin);
        self.qmax = Some(qmax);
        self
    }

    pub fn with_subsampling(mut self, subsampling: Subsampling) -> Self {
        self.subsampling = subsampling;
        self
    }

    pub fn with_speed(mut self, speed: i64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_max_threads(mut self, max_threads: u32) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_codec(mut self, codec: CodecChoice) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_range(mut self, range: YuvRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_tiles(mut self, rows_log2: i64, cols_log2: i64) -> Self {
        self.tile_rows_log2 = rows_log2;
        self.tile_cols_log2 = cols_log2;
        self
    }

    pub fn with_autotiling(mut self, autotiling: bool) -> Self {
        self.autotiling = Some(autotiling);
        self
    }

    pub fn with_alpha_premultiplied(mut self, premultiplied: bool) -> Self {
        self.alpha_premultiplied = premultiplied;
        self
    }

    pub fn with_advanced(mut self, advanced: AdvancedOptions) -> Self {
        self.advanced = advanced;
        self
    }

    pub fn with_duration(mut self, duration: FrameDurations) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_icc_profile(mut self, icc: Vec<u8>) -> Self {
        self.icc_profile = Some(icc);
        self
    }

    pub fn with_exif(mut self, exif: Vec<u8>) -> Self {
        self.exif = Some(exif);
        self
    }

    pub fn with_xmp(mut self, xmp: XmpInput) -> Self {
        self.xmp = Some(xmp);
        self
    }

    /// Build from a loosely typed option map.
    ///
    /// Unknown keys are ignored. `null` means "not given".
    pub fn from_json(options: &Map<String, Value>) -> Result<Self> {
        let mut params = Self::default();
        for (key, value) in options.iter().filter(|(_, v)| !v.is_null()) {
            match key.as_str() {
                "quality" => {
                    params.quality = value.as_i64().ok_or_else(|| {
                        AvifError::InvalidQuality(format!("expected an integer, got {value}"))
                    })?;
                }
                "qmin" => params.qmin = Some(quantizer(value)?),
                "qmax" => params.qmax = Some(quantizer(value)?),
                "subsampling" => {
                    params.subsampling = value
                        .as_str()
                        .ok_or_else(|| AvifError::InvalidSubsampling(value.to_string()))?
                        .parse()?;
                }
                "speed" => params.speed = integer("speed", value)?,
                "max_threads" => params.max_threads = thread_count(value)?,
                "codec" => params.codec = codec(value)?,
                "range" => {
                    params.range = value
                        .as_str()
                        .ok_or_else(|| AvifError::InvalidRange(value.to_string()))?
                        .parse()?;
                }
                "tile_rows" => params.tile_rows_log2 = integer("tile_rows", value)?,
                "tile_cols" => params.tile_cols_log2 = integer("tile_cols", value)?,
                "alpha_premultiplied" => {
                    params.alpha_premultiplied = boolean("alpha_premultiplied", value)?;
                }
                "autotiling" => params.autotiling = Some(boolean("autotiling", value)?),
                "advanced" => params.advanced = AdvancedOptions::from_json(value)?,
                "duration" => {
                    params.duration = serde_json::from_value(value.clone()).map_err(|_| {
                        AvifError::InvalidDuration(format!(
                            "expected a non-negative integer or a list of them, got {value}"
                        ))
                    })?;
                }
                "icc_profile" => params.icc_profile = Some(bytes("icc_profile", value)?),
                "exif" => params.exif = Some(bytes("exif", value)?),
                "xmp" => {
                    params.xmp = Some(serde_json::from_value(value.clone()).map_err(|_| {
                        AvifError::InvalidOption {
                            key: "xmp",
                            reason: format!("expected a string or a byte array, got {value}"),
                        }
                    })?);
                }
                other => trace!(key = other, "ignoring unknown encode option"),
            }
        }
        Ok(params)
    }
}

/// Parameters for opening an AVIF container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecodeParams {
    pub codec: CodecChoice,
    pub upsampling: ChromaUpsampling,
    /// 0 means one thread per available CPU.
    pub max_threads: u32,
}

impl DecodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(mut self, codec: CodecChoice) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_upsampling(mut self, upsampling: ChromaUpsampling) -> Self {
        self.upsampling = upsampling;
        self
    }

    pub fn with_max_threads(mut self, max_threads: u32) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Build from a loosely typed option map. Unknown keys are ignored.
    pub fn from_json(options: &Map<String, Value>) -> Result<Self> {
        let mut params = Self::default();
        for (key, value) in options.iter().filter(|(_, v)| !v.is_null()) {
            match key.as_str() {
                "codec" => params.codec = codec(value)?,
                "upsampling" => {
                    params.upsampling = value
                        .as_str()
                        .ok_or_else(|| AvifError::InvalidUpsampling(value.to_string()))?
                        .parse()?;
                }
                "max_threads" => params.max_threads = thread_count(value)?,
                other => trace!(key = other, "ignoring unknown decode option"),
            }
        }
        Ok(params)
    }
}

fn integer(key: &'static str, value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| AvifError::InvalidOption {
        key,
        reason: format!("expected an integer, got {value}"),
    })
}

fn quantizer(value: &Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| AvifError::InvalidQuality(format!("expected an integer quantizer, got {value}")))
}

fn thread_count(value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| AvifError::InvalidOption {
            key: "max_threads",
            reason: format!("expected a non-negative integer, got {value}"),
        })
}

fn boolean(key: &'static str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| AvifError::InvalidOption {
        key,
        reason: format!("expected a boolean, got {value}"),
    })
}

fn codec(value: &Value) -> Result<CodecChoice> {
    value
        .as_str()
        .map(CodecChoice::named)
        .ok_or_else(|| AvifError::InvalidOption {
            key: "codec",
            reason: format!("expected a codec name, got {value}"),
        })
}

fn bytes(key: &'static str, value: &Value) -> Result<Vec<u8>> {
    serde_json::from_value(value.clone()).map_err(|_| AvifError::InvalidOption {
        key,
        reason: format!("expected a byte array, got {value}"),
    })
}
