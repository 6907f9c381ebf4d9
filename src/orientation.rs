//! EXIF orientation and its HEIF `irot`/`imir` equivalent.

/// EXIF orientation tag values.
///
/// Describes how the stored pixels should be transformed for display.
/// Values match the EXIF Orientation tag (TIFF tag 274). In an AVIF
/// container the same information lives in the `irot` and `imir`
/// properties; see [`ContainerTransform`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// No rotation or flip needed.
    #[default]
    Normal = 1,
    /// Flip horizontally (mirror left-right).
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Flip vertically (mirror top-bottom).
    FlipVertical = 4,
    /// Transpose (rotate 90 CW then flip horizontally).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90 = 6,
    /// Transverse (rotate 90 CCW then flip horizontally).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (= 90 CCW).
    Rotate270 = 8,
}

impl Orientation {
    /// Create from an EXIF orientation value (1-8).
    ///
    /// Returns `None` for out-of-range values.
    pub fn from_exif(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::Normal,
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => return None,
        })
    }

    /// EXIF tag value (1-8).
    pub fn exif_value(self) -> u16 {
        self as u16
    }

    /// Whether this orientation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Compute display dimensions for the given stored dimensions.
    pub fn display_dimensions(self, stored_width: u32, stored_height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (stored_height, stored_width)
        } else {
            (stored_width, stored_height)
        }
    }

    /// Whether any transformation is needed.
    pub fn is_identity(self) -> bool {
        matches!(self, Self::Normal)
    }

    /// HEIF transform properties that express this orientation.
    ///
    /// Rotation is applied before mirroring (MIAF, ISO/IEC 23000-22 7.3.6.7).
    pub fn to_transform(self) -> ContainerTransform {
        let (rotation, mirror) = match self {
            Self::Normal => (0, None),
            Self::FlipHorizontal => (0, Some(MirrorAxis::Horizontal)),
            Self::Rotate180 => (2, None),
            Self::FlipVertical => (0, Some(MirrorAxis::Vertical)),
            Self::Transpose => (1, Some(MirrorAxis::Vertical)),
            Self::Rotate90 => (3, None),
            Self::Transverse => (3, Some(MirrorAxis::Vertical)),
            Self::Rotate270 => (1, None),
        };
        ContainerTransform { rotation, mirror }
    }

    /// EXIF orientation equivalent to a pair of HEIF transform properties.
    pub fn from_transform(transform: ContainerTransform) -> Self {
        use MirrorAxis::{Horizontal, Vertical};
        match (transform.rotation % 4, transform.mirror) {
            (0, None) => Self::Normal,
            (0, Some(Horizontal)) => Self::FlipHorizontal,
            (0, Some(Vertical)) => Self::FlipVertical,
            (1, None) => Self::Rotate270,
            (1, Some(Vertical)) => Self::Transpose,
            (1, Some(Horizontal)) => Self::Transverse,
            (2, None) => Self::Rotate180,
            (2, Some(Horizontal)) => Self::FlipVertical,
            (2, Some(Vertical)) => Self::FlipHorizontal,
            (3, None) => Self::Rotate90,
            (3, Some(Vertical)) => Self::Transverse,
            (3, Some(Horizontal)) => Self::Transpose,
            _ => unreachable!("rotation is reduced modulo 4"),
        }
    }
}

impl TryFrom<u16> for Orientation {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_exif(value).ok_or(value)
    }
}

/// Mirror axis of the HEIF `imir` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MirrorAxis {
    /// Axis 0: top and bottom are swapped.
    Vertical = 0,
    /// Axis 1: left and right are swapped.
    Horizontal = 1,
}

/// The `irot` and `imir` properties of an AVIF item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContainerTransform {
    /// Anti-clockwise rotation in quarter turns (`irot` angle, 0-3).
    pub rotation: u8,
    /// Mirror applied after rotation (`imir`), if any.
    pub mirror: Option<MirrorAxis>,
}
