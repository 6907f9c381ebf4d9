//! Metadata reconciliation for the read and write paths.
//!
//! AVIF stores orientation twice: as container transform properties and,
//! optionally, as a tag inside an EXIF blob. On read the container wins and
//! the EXIF copy is brought in line. On write the EXIF tag is extracted so
//! the binding can set the container properties from it.

use tracing::{debug, warn};

use crate::binding::DecodeInfo;
use crate::exif;
use crate::orientation::Orientation;
use crate::params::EncodeParams;

/// Metadata of an opened sequence, as exposed to callers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ImageMetadata {
    /// Embedded ICC color profile.
    pub icc_profile: Option<Vec<u8>>,
    /// EXIF blob, with an orientation tag matching `orientation`.
    pub exif: Option<Vec<u8>>,
    /// XMP packet.
    pub xmp: Option<Vec<u8>>,
    /// Container orientation.
    pub orientation: Orientation,
}

impl ImageMetadata {
    /// Empty metadata.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_icc(mut self, icc: Vec<u8>) -> Self {
        self.icc_profile = Some(icc);
        self
    }

    pub fn with_exif(mut self, exif: Vec<u8>) -> Self {
        self.exif = Some(exif);
        self
    }

    pub fn with_xmp(mut self, xmp: Vec<u8>) -> Self {
        self.xmp = Some(xmp);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Whether no metadata is present.
    pub fn is_empty(&self) -> bool {
        self.icc_profile.is_none()
            && self.exif.is_none()
            && self.xmp.is_none()
            && self.orientation.is_identity()
    }
}

/// Metadata a source image carries natively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct SourceMetadata {
    pub icc_profile: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
    pub xmp: Option<Vec<u8>>,
    /// XMP stored under the legacy `XML:com.adobe.xmp` key. Used when `xmp` is empty.
    pub adobe_xmp: Option<Vec<u8>>,
}

impl SourceMetadata {
    pub fn with_icc(mut self, icc: Vec<u8>) -> Self {
        self.icc_profile = Some(icc);
        self
    }

    pub fn with_exif(mut self, exif: Vec<u8>) -> Self {
        self.exif = Some(exif);
        self
    }

    pub fn with_xmp(mut self, xmp: Vec<u8>) -> Self {
        self.xmp = Some(xmp);
        self
    }

    pub fn with_adobe_xmp(mut self, xmp: Vec<u8>) -> Self {
        self.adobe_xmp = Some(xmp);
        self
    }
}

/// Metadata handed to the encoder. Absent values are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodeMetadata {
    pub icc: Vec<u8>,
    pub exif: Vec<u8>,
    /// EXIF orientation (1-8) to express as container properties, 0 for none.
    pub orientation: u8,
    pub xmp: Vec<u8>,
}

impl EncodeMetadata {
    /// Orientation as a typed value, `None` when the encoder should not set one.
    pub fn orientation(&self) -> Option<Orientation> {
        Orientation::from_exif(u16::from(self.orientation))
    }
}

/// Caller-visible metadata for an opened container.
pub fn reconcile_read(info: &DecodeInfo) -> ImageMetadata {
    let orientation = Orientation::from_exif(u16::from(info.orientation)).unwrap_or_else(|| {
        warn!(
            orientation = info.orientation,
            "container orientation out of range, using 1"
        );
        Orientation::Normal
    });
    let value = orientation.exif_value();

    let exif = if info.exif.is_empty() {
        (!orientation.is_identity()).then(|| exif::minimal(value))
    } else {
        Some(match exif::read_orientation(&info.exif) {
            Ok(tag) if tag.unwrap_or(1) == value => info.exif.clone(),
            Ok(tag) => {
                debug!(?tag, container = value, "rewriting EXIF orientation");
                exif::with_orientation(&info.exif, value).unwrap_or_else(|e| {
                    warn!(error = %e, "could not rewrite EXIF orientation");
                    exif::minimal(value)
                })
            }
            Err(e) if orientation.is_identity() => {
                debug!(error = %e, "passing through unparseable EXIF");
                info.exif.clone()
            }
            Err(e) => {
                warn!(error = %e, "replacing unparseable EXIF");
                exif::minimal(value)
            }
        })
    };

    ImageMetadata {
        icc_profile: non_empty(&info.icc),
        exif,
        xmp: non_empty(&info.xmp),
        orientation,
    }
}

/// Metadata for the encoder: caller values first, then the source's own.
///
/// An EXIF orientation tag outside 1-8 becomes 0, the same as no tag. The
/// EXIF blob itself is forwarded unchanged, so encoders that read the tag
/// from the blob still see the original value.
pub fn reconcile_write(params: &EncodeParams, source: &SourceMetadata) -> EncodeMetadata {
    let icc = params
        .icc_profile
        .clone()
        .or_else(|| source.icc_profile.clone())
        .unwrap_or_default();
    let exif = params
        .exif
        .clone()
        .or_else(|| source.exif.clone())
        .unwrap_or_default();
    let xmp = match &params.xmp {
        Some(xmp) => xmp.clone().into_bytes(),
        None => source
            .xmp
            .clone()
            .filter(|x| !x.is_empty())
            .or_else(|| source.adobe_xmp.clone())
            .unwrap_or_default(),
    };

    let orientation = if exif.is_empty() {
        0
    } else {
        match exif::read_orientation(&exif) {
            Ok(Some(v)) if (1..=8).contains(&v) => v as u8,
            Ok(_) => 0,
            Err(e) => {
                debug!(error = %e, "ignoring unparseable EXIF orientation");
                0
            }
        }
    };

    EncodeMetadata {
        icc,
        exif,
        orientation,
        xmp,
    }
}

fn non_empty(bytes: &[u8]) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then(|| bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::XmpInput;

    fn info(orientation: u8, exif: Vec<u8>) -> DecodeInfo {
        DecodeInfo {
            width: 1,
            height: 1,
            frame_count: 1,
            exif,
            orientation,
            ..DecodeInfo::default()
        }
    }

    #[test]
    fn read_synthesizes_exif_for_rotation() {
        let meta = reconcile_read(&info(3, Vec::new()));
        assert_eq!(meta.orientation, Orientation::Rotate180);
        let exif = meta.exif.unwrap();
        assert_eq!(exif::read_orientation(&exif).unwrap(), Some(3));
    }

    #[test]
    fn read_leaves_identity_alone() {
        let meta = reconcile_read(&info(1, Vec::new()));
        assert_eq!(meta.exif, None);
        assert!(meta.is_empty());
    }

    #[test]
    fn read_container_overrides_exif() {
        let meta = reconcile_read(&info(3, exif::minimal(6)));
        assert_eq!(exif::read_orientation(&meta.exif.unwrap()).unwrap(), Some(3));
    }

    #[test]
    fn read_matching_exif_is_untouched() {
        let blob = exif::minimal(6);
        let meta = reconcile_read(&info(6, blob.clone()));
        assert_eq!(meta.exif, Some(blob));
    }

    #[test]
    fn read_unparseable_exif() {
        let junk = b"definitely not tiff".to_vec();
        let meta = reconcile_read(&info(1, junk.clone()));
        assert_eq!(meta.exif, Some(junk.clone()));

        let meta = reconcile_read(&info(8, junk));
        assert_eq!(exif::read_orientation(&meta.exif.unwrap()).unwrap(), Some(8));
    }

    #[test]
    fn read_out_of_range_orientation_is_normal() {
        let meta = reconcile_read(&info(0, Vec::new()));
        assert_eq!(meta.orientation, Orientation::Normal);
        let meta = reconcile_read(&info(9, Vec::new()));
        assert_eq!(meta.orientation, Orientation::Normal);
        assert_eq!(meta.exif, None);
    }

    #[test]
    fn read_passes_icc_and_xmp() {
        let mut i = info(1, Vec::new());
        i.icc = vec![1, 2];
        i.xmp = b"<x/>".to_vec();
        let meta = reconcile_read(&i);
        assert_eq!(meta.icc_profile, Some(vec![1, 2]));
        assert_eq!(meta.xmp.as_deref(), Some(&b"<x/>"[..]));
    }

    #[test]
    fn write_extracts_orientation() {
        let params = EncodeParams::new().with_exif(exif::minimal(6));
        let meta = reconcile_write(&params, &SourceMetadata::default());
        assert_eq!(meta.orientation, 6);
        assert_eq!(meta.orientation(), Some(Orientation::Rotate90));
        assert_eq!(meta.exif, exif::minimal(6));
    }

    #[test]
    fn write_without_exif_has_no_orientation() {
        let meta = reconcile_write(&EncodeParams::new(), &SourceMetadata::default());
        assert_eq!(meta, EncodeMetadata::default());
        assert_eq!(meta.orientation(), None);

        let params = EncodeParams::new().with_exif(b"garbage".to_vec());
        assert_eq!(reconcile_write(&params, &SourceMetadata::default()).orientation, 0);
    }

    #[test]
    fn write_out_of_range_orientation_is_none() {
        let blob = exif::minimal(9);
        let params = EncodeParams::new().with_exif(blob.clone());
        let meta = reconcile_write(&params, &SourceMetadata::default());
        assert_eq!(meta.orientation, 0);
        assert_eq!(meta.exif, blob);
    }

    #[test]
    fn write_prefers_caller_values() {
        let source = SourceMetadata::default()
            .with_icc(vec![1])
            .with_exif(exif::minimal(3))
            .with_xmp(b"native".to_vec());
        let meta = reconcile_write(&EncodeParams::new(), &source);
        assert_eq!(meta.icc, [1]);
        assert_eq!(meta.orientation, 3);
        assert_eq!(meta.xmp, b"native");

        let params = EncodeParams::new()
            .with_icc_profile(vec![2])
            .with_xmp(XmpInput::Text("caller".into()));
        let meta = reconcile_write(&params, &source);
        assert_eq!(meta.icc, [2]);
        assert_eq!(meta.xmp, b"caller");
    }

    #[test]
    fn write_falls_back_to_adobe_xmp() {
        let source = SourceMetadata::default()
            .with_xmp(Vec::new())
            .with_adobe_xmp(b"adobe".to_vec());
        let meta = reconcile_write(&EncodeParams::new(), &source);
        assert_eq!(meta.xmp, b"adobe");
    }
}
