//! Parameter validation and normalization.
//!
//! Runs before any encoder or decoder is created. The only thing a
//! validator asks of the binding is which codecs it knows.

use tracing::{debug, warn};

use crate::binding::{CodecBinding, Direction};
use crate::capabilities::CodecCapabilities;
use crate::config::{CodecChoice, DecoderConfig, EncoderConfig, QuantizerRange};
use crate::error::{AvifError, CodecRejection, Result};
use crate::params::{DecodeParams, EncodeParams};

/// Slowest encoder speed.
pub const SPEED_SLOWEST: u8 = 0;
/// Fastest encoder speed.
pub const SPEED_FASTEST: u8 = 10;
/// Largest tile rows/cols log2.
pub const MAX_TILES_LOG2: u8 = 6;
/// Thread cap applied to encodes that go through libaom.
pub const AOM_MAX_THREADS: u32 = 64;

/// Validate encode parameters against a binding.
pub fn validate_encode<B: CodecBinding + ?Sized>(
    params: &EncodeParams,
    binding: &B,
) -> Result<EncoderConfig> {
    if !(0..=100).contains(&params.quality) {
        return Err(AvifError::InvalidQuality(format!(
            "quality must be an integer between 0 and 100, got {}",
            params.quality
        )));
    }
    let quality = params.quality as u8;

    let (quantizers, explicit_quantizers) = match (params.qmin, params.qmax) {
        (Some(min), Some(max)) => (QuantizerRange::explicit(min, max)?, true),
        _ => (QuantizerRange::from_quality(quality), false),
    };

    let caps = check_codec(&params.codec, binding, Direction::Encode)?;
    if let Some(caps) = caps {
        if !params.advanced.is_empty() && !caps.advanced_options() {
            return Err(AvifError::invalid_codec(
                caps.name(),
                CodecRejection::NoAdvancedOptions,
            ));
        }
    }

    let mut max_threads = resolve_threads(params.max_threads);
    let uses_aom = match &params.codec {
        CodecChoice::Named(name) => name == "aom",
        CodecChoice::Auto => binding.codec_available("aom", Direction::Encode),
    };
    if uses_aom && max_threads > AOM_MAX_THREADS {
        max_threads = AOM_MAX_THREADS;
    }

    let autotiling = params
        .autotiling
        .unwrap_or(params.tile_rows_log2 == 0 && params.tile_cols_log2 == 0);

    let config = EncoderConfig {
        quality,
        quantizers,
        explicit_quantizers,
        subsampling: params.subsampling,
        speed: params
            .speed
            .clamp(i64::from(SPEED_SLOWEST), i64::from(SPEED_FASTEST)) as u8,
        max_threads,
        codec: params.codec.clone(),
        range: params.range,
        tile_rows_log2: clamp_tiles(params.tile_rows_log2),
        tile_cols_log2: clamp_tiles(params.tile_cols_log2),
        autotiling,
        alpha_premultiplied: params.alpha_premultiplied,
        advanced: params.advanced.clone(),
    };
    debug!(
        quality = config.quality,
        qmin = config.quantizers.min,
        qmax = config.quantizers.max,
        speed = config.speed,
        threads = config.max_threads,
        codec = %config.codec,
        "validated encoder config"
    );
    Ok(config)
}

/// Validate decode parameters against a binding.
pub fn validate_decode<B: CodecBinding + ?Sized>(
    params: &DecodeParams,
    binding: &B,
) -> Result<DecoderConfig> {
    check_codec(&params.codec, binding, Direction::Decode)?;
    Ok(DecoderConfig {
        codec: params.codec.clone(),
        upsampling: params.upsampling,
        max_threads: resolve_threads(params.max_threads),
    })
}

/// Capabilities of a named codec that supports `direction`. `None` for auto.
fn check_codec<B: CodecBinding + ?Sized>(
    codec: &CodecChoice,
    binding: &B,
    direction: Direction,
) -> Result<Option<CodecCapabilities>> {
    let CodecChoice::Named(name) = codec else {
        return Ok(None);
    };
    let Some(caps) = binding.codec_capabilities(name) else {
        return Err(AvifError::invalid_codec(name, CodecRejection::UnknownCodec));
    };
    if caps.supports(direction) {
        return Ok(Some(caps));
    }
    let reason = match direction {
        Direction::Encode => CodecRejection::CannotEncode,
        Direction::Decode => CodecRejection::CannotDecode,
    };
    Err(AvifError::invalid_codec(name, reason))
}

/// Reject a sequence of more than one frame for a named codec that only
/// handles stills. Auto lets the binding pick a codec that can. The codec
/// name itself is checked by [`validate_encode`] / [`validate_decode`].
pub(crate) fn check_animation<B: CodecBinding + ?Sized>(
    codec: &CodecChoice,
    binding: &B,
    direction: Direction,
    frames: u32,
) -> Result<()> {
    if frames <= 1 {
        return Ok(());
    }
    let CodecChoice::Named(name) = codec else {
        return Ok(());
    };
    let Some(caps) = binding.codec_capabilities(name) else {
        return Ok(());
    };
    let (animates, reason) = match direction {
        Direction::Encode => (caps.encode_animation(), CodecRejection::CannotEncodeAnimation),
        Direction::Decode => (caps.decode_animation(), CodecRejection::CannotDecodeAnimation),
    };
    if animates {
        Ok(())
    } else {
        Err(AvifError::invalid_codec(caps.name(), reason))
    }
}

fn clamp_tiles(log2: i64) -> u8 {
    log2.clamp(0, i64::from(MAX_TILES_LOG2)) as u8
}

/// `0` becomes the available parallelism.
pub(crate) fn resolve_threads(requested: u32) -> u32 {
    if requested != 0 {
        return requested;
    }
    match std::thread::available_parallelism() {
        Ok(n) => u32::try_from(n.get()).unwrap_or(u32::MAX),
        Err(e) => {
            warn!(error = %e, "could not get cpu count: using max_threads=1");
            1
        }
    }
}
