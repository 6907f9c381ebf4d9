//! Host-facing entry points: identify, open and save AVIF files.
//!
//! [`AvifFormat`] bundles an optional codec binding with default decode
//! parameters and resource limits. With no binding the format still
//! identifies AVIF files, but reports them as unsupported.

use tracing::{debug, info};

use crate::binding::CodecBinding;
use crate::error::{AvifError, Result};
use crate::limits::ResourceLimits;
use crate::output::EncodeOutput;
use crate::params::{DecodeParams, EncodeParams};
use crate::reader::SequenceReader;
use crate::sniff::{Sniff, sniff};
use crate::source::SourceImage;
use crate::validate::validate_decode;
use crate::writer::encode_sequence;

/// How a host registers this format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Lowercase, with leading dots.
    pub extensions: &'static [&'static str],
    pub mime_type: &'static str,
}

impl FormatDescriptor {
    /// Whether `ext` (with or without a leading dot, any case) is one of ours.
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.extensions
            .iter()
            .any(|known| known[1..].eq_ignore_ascii_case(ext))
    }
}

/// Registration data for AVIF.
pub const AVIF: FormatDescriptor = FormatDescriptor {
    name: "AVIF",
    description: "AVIF image",
    extensions: &[".avif", ".avifs"],
    mime_type: "image/avif",
};

/// AVIF support for a host, optionally backed by a codec binding.
#[derive(Clone, Debug)]
pub struct AvifFormat<B> {
    binding: Option<B>,
    decode: DecodeParams,
    limits: ResourceLimits,
}

impl<B: CodecBinding> AvifFormat<B> {
    /// `None` means no AV1 codec is installed.
    pub fn new(binding: Option<B>) -> Self {
        if binding.is_none() {
            info!("no AVIF codec binding available");
        }
        Self {
            binding,
            decode: DecodeParams::default(),
            limits: ResourceLimits::none(),
        }
    }

    /// Parameters used by [`AvifFormat::open`].
    pub fn with_decode_params(mut self, params: DecodeParams) -> Self {
        self.decode = params;
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn descriptor(&self) -> &'static FormatDescriptor {
        &AVIF
    }

    pub fn binding(&self) -> Option<&B> {
        self.binding.as_ref()
    }

    pub fn is_supported(&self) -> bool {
        self.binding.is_some()
    }

    /// Identify a file from its first bytes. Never fails.
    pub fn accept(&self, prefix: &[u8]) -> Sniff {
        sniff(prefix, self.is_supported())
    }

    /// Open a container with the configured decode parameters.
    pub fn open(&self, data: &[u8]) -> Result<SequenceReader<B::Decoder>> {
        self.open_with(data, &self.decode)
    }

    /// Open a container with explicit decode parameters.
    pub fn open_with(
        &self,
        data: &[u8],
        params: &DecodeParams,
    ) -> Result<SequenceReader<B::Decoder>> {
        let sniffed = self.accept(data);
        let binding = match (sniffed, &self.binding) {
            (Sniff::NotAvif, _) => {
                return Err(AvifError::MalformedContainer(
                    "missing AVIF ftyp brand".into(),
                ));
            }
            (_, None) => {
                return Err(AvifError::UnsupportedContainer(
                    "image file could not be opened".into(),
                ));
            }
            (_, Some(binding)) => binding,
        };
        debug!(brand = ?sniffed.brand(), "opening AVIF");
        let config = validate_decode(params, binding)?;
        SequenceReader::open(binding, data, &config, &self.limits)
    }

    /// Write the first frame of `image`, leaving its current frame unchanged.
    pub fn save(&self, image: &mut dyn SourceImage, params: &EncodeParams) -> Result<EncodeOutput> {
        encode_sequence(self.encoder()?, image, &mut [], params, false, &self.limits)
    }

    /// Write every frame of `primary` followed by every frame of `append`.
    pub fn save_all(
        &self,
        primary: &mut dyn SourceImage,
        append: &mut [&mut dyn SourceImage],
        params: &EncodeParams,
    ) -> Result<EncodeOutput> {
        encode_sequence(self.encoder()?, primary, append, params, true, &self.limits)
    }

    fn encoder(&self) -> Result<&B> {
        self.binding.as_ref().ok_or_else(|| {
            AvifError::UnsupportedContainer("image file could not be saved".into())
        })
    }
}
