//! Typed pixel buffers and the layout tags exchanged with codec bindings.
//!
//! Uses `imgref::ImgVec` for 2D pixel data with typed pixels from the `rgb` crate.

use core::fmt;
use core::str::FromStr;

use imgref::ImgVec;
use rgb::{Rgb, Rgba};
use serde::{Deserialize, Serialize};

/// Interleaved 8-bit pixel layout of a frame buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Three bytes per pixel: red, green, blue.
    #[default]
    #[serde(rename = "RGB")]
    Rgb,
    /// Four bytes per pixel: red, green, blue, alpha.
    #[serde(rename = "RGBA")]
    Rgba,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the layout carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Layout that keeps or drops alpha.
    pub const fn for_alpha(alpha: bool) -> Self {
        if alpha { Self::Rgba } else { Self::Rgb }
    }

    /// Canonical name (`RGB` or `RGBA`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
        }
    }

    /// Expected buffer length for a frame of the given size, if it fits in memory.
    pub fn buffer_len(self, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(self.channels())
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RGB" => Ok(Self::Rgb),
            "RGBA" => Ok(Self::Rgba),
            other => Err(other.to_owned()),
        }
    }
}

/// Decoded frame pixels in a typed buffer.
///
/// Width and height are embedded in the `ImgVec`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PixelData {
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
}

impl PixelData {
    /// Wrap an interleaved byte buffer.
    ///
    /// Returns `None` when `bytes.len()` does not match `layout` and the
    /// dimensions.
    pub fn from_bytes(
        layout: PixelLayout,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Option<Self> {
        if layout.buffer_len(width, height)? != bytes.len() {
            return None;
        }
        let (w, h) = (width as usize, height as usize);
        Some(match layout {
            PixelLayout::Rgb => {
                let buf = bytes
                    .chunks_exact(3)
                    .map(|c| Rgb {
                        r: c[0],
                        g: c[1],
                        b: c[2],
                    })
                    .collect();
                PixelData::Rgb8(ImgVec::new(buf, w, h))
            }
            PixelLayout::Rgba => {
                let buf = bytes
                    .chunks_exact(4)
                    .map(|c| Rgba {
                        r: c[0],
                        g: c[1],
                        b: c[2],
                        a: c[3],
                    })
                    .collect();
                PixelData::Rgba8(ImgVec::new(buf, w, h))
            }
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            PixelData::Rgb8(img) => img.width() as u32,
            PixelData::Rgba8(img) => img.width() as u32,
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            PixelData::Rgb8(img) => img.height() as u32,
            PixelData::Rgba8(img) => img.height() as u32,
        }
    }

    /// Layout of this buffer.
    pub fn layout(&self) -> PixelLayout {
        match self {
            PixelData::Rgb8(_) => PixelLayout::Rgb,
            PixelData::Rgba8(_) => PixelLayout::Rgba,
        }
    }

    /// Whether this pixel data has an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, PixelData::Rgba8(_))
    }

    /// Interleaved bytes in row order, without stride padding.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PixelData::Rgb8(img) => img
                .as_ref()
                .pixels()
                .flat_map(|p| [p.r, p.g, p.b])
                .collect(),
            PixelData::Rgba8(img) => img
                .as_ref()
                .pixels()
                .flat_map(|p| [p.r, p.g, p.b, p.a])
                .collect(),
        }
    }

    /// Convert to RGB8 by reference, discarding alpha.
    pub fn to_rgb8(&self) -> ImgVec<Rgb<u8>> {
        match self {
            PixelData::Rgb8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                ImgVec::new(buf.into_owned(), w, h)
            }
            PixelData::Rgba8(img) => {
                let rgb = img
                    .as_ref()
                    .pixels()
                    .map(|p| Rgb {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                    })
                    .collect();
                ImgVec::new(rgb, img.width(), img.height())
            }
        }
    }

    /// Convert to RGBA8 by reference, adding opaque alpha where missing.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                ImgVec::new(buf.into_owned(), w, h)
            }
            PixelData::Rgb8(img) => {
                let rgba = img
                    .as_ref()
                    .pixels()
                    .map(|p| Rgba {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                        a: 255,
                    })
                    .collect();
                ImgVec::new(rgba, img.width(), img.height())
            }
        }
    }
}
