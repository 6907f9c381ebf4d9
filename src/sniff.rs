//! AVIF container detection from a byte prefix.

/// Bytes needed to sniff a container.
pub const SNIFF_LEN: usize = 12;

/// Major brands of an ISO-BMFF `ftyp` box that may hold AVIF.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Brand {
    /// AVIF still image.
    Avif,
    /// AVIF image sequence.
    Avis,
    /// Generic HEIF image container.
    Mif1,
    /// Generic HEIF image sequence container.
    Msf1,
}

impl Brand {
    /// Parse a four-character brand code.
    pub fn from_code(code: &[u8]) -> Option<Self> {
        match code {
            b"avif" => Some(Brand::Avif),
            b"avis" => Some(Brand::Avis),
            b"mif1" => Some(Brand::Mif1),
            b"msf1" => Some(Brand::Msf1),
            _ => None,
        }
    }

    /// Four-character code as it appears in the `ftyp` box.
    pub fn code(self) -> &'static [u8; 4] {
        match self {
            Brand::Avif => b"avif",
            Brand::Avis => b"avis",
            Brand::Mif1 => b"mif1",
            Brand::Msf1 => b"msf1",
        }
    }

    /// Whether the brand announces an image sequence.
    pub fn is_sequence(self) -> bool {
        matches!(self, Brand::Avis | Brand::Msf1)
    }

    /// Whether the brand is AVIF-specific rather than a generic HEIF brand.
    ///
    /// Generic brands are accepted too; whether the file really holds AV1
    /// is only known once the binding opens it.
    pub fn is_avif_coding(self) -> bool {
        matches!(self, Brand::Avif | Brand::Avis)
    }
}

/// Result of sniffing a byte prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sniff {
    /// Not an AVIF container. Other handlers may try.
    NotAvif,
    /// An AVIF container this crate can open.
    Recognized(Brand),
    /// An AVIF container, but no codec binding is available to open it.
    Unsupported(Brand),
}

impl Sniff {
    /// Whether the prefix looked like AVIF, supported or not.
    pub fn is_avif(self) -> bool {
        !matches!(self, Sniff::NotAvif)
    }

    /// The brand, if the prefix looked like AVIF.
    pub fn brand(self) -> Option<Brand> {
        match self {
            Sniff::NotAvif => None,
            Sniff::Recognized(b) | Sniff::Unsupported(b) => Some(b),
        }
    }

    /// Diagnostic for [`Sniff::Unsupported`].
    pub fn diagnostic(self) -> Option<&'static str> {
        matches!(self, Sniff::Unsupported(_))
            .then_some("image file could not be identified because AVIF support not installed")
    }
}

/// Sniff the first bytes of a file.
///
/// `supported` says whether a codec binding is available. Prefixes shorter
/// than [`SNIFF_LEN`] are never AVIF.
pub fn sniff(prefix: &[u8], supported: bool) -> Sniff {
    if prefix.len() < SNIFF_LEN || &prefix[4..8] != b"ftyp" {
        return Sniff::NotAvif;
    }
    match Brand::from_code(&prefix[8..12]) {
        None => Sniff::NotAvif,
        Some(brand) if supported => Sniff::Recognized(brand),
        Some(brand) => Sniff::Unsupported(brand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
        let mut v = vec![0, 0, 0, 0x1c];
        v.extend_from_slice(b"ftyp");
        v.extend_from_slice(brand);
        v.extend_from_slice(&[0, 0, 0, 0]);
        v
    }

    #[test]
    fn recognizes_all_brands() {
        for (code, brand) in [
            (b"avif", Brand::Avif),
            (b"avis", Brand::Avis),
            (b"mif1", Brand::Mif1),
            (b"msf1", Brand::Msf1),
        ] {
            assert_eq!(sniff(&ftyp(code), true), Sniff::Recognized(brand));
            assert_eq!(brand.code(), code);
        }
    }

    #[test]
    fn rejects_other_brands_and_boxes() {
        assert_eq!(sniff(&ftyp(b"heic"), true), Sniff::NotAvif);
        assert_eq!(sniff(&ftyp(b"jpeg"), false), Sniff::NotAvif);
        let mut not_ftyp = ftyp(b"avif");
        not_ftyp[4..8].copy_from_slice(b"moov");
        assert_eq!(sniff(&not_ftyp, true), Sniff::NotAvif);
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n", true), Sniff::NotAvif);
    }

    #[test]
    fn short_prefix_is_not_avif() {
        let full = ftyp(b"avif");
        assert_eq!(sniff(&full[..11], true), Sniff::NotAvif);
        assert_eq!(sniff(&full[..12], true), Sniff::Recognized(Brand::Avif));
        assert_eq!(sniff(&[], true), Sniff::NotAvif);
    }

    #[test]
    fn without_binding_is_unsupported_not_rejected() {
        let s = sniff(&ftyp(b"avis"), false);
        assert_eq!(s, Sniff::Unsupported(Brand::Avis));
        assert!(s.is_avif());
        assert_eq!(s.brand(), Some(Brand::Avis));
        assert!(s.diagnostic().unwrap().contains("not installed"));
        assert_eq!(sniff(&ftyp(b"avis"), true).diagnostic(), None);
    }

    #[test]
    fn brand_properties() {
        assert!(Brand::Avis.is_sequence());
        assert!(Brand::Msf1.is_sequence());
        assert!(!Brand::Avif.is_sequence());
        assert!(Brand::Avif.is_avif_coding());
        assert!(!Brand::Mif1.is_avif_coding());
    }
}
