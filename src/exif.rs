//! Just enough EXIF to read and rewrite the orientation tag.
//!
//! A blob is an optional `Exif\0\0` marker followed by a TIFF structure.
//! Only IFD0 is visited. Every other byte is preserved, so offsets held by
//! other tags stay valid after a rewrite.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// `Exif\0\0` marker some containers put in front of the TIFF header.
pub const EXIF_MARKER: &[u8; 6] = b"Exif\0\0";

/// TIFF tag 274.
pub const ORIENTATION_TAG: u16 = 0x0112;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const ENTRY_LEN: usize = 12;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExifError {
    #[error("missing TIFF header")]
    NotTiff,
    #[error("EXIF data is truncated")]
    Truncated(#[from] std::io::Error),
    #[error("EXIF data is too large to extend")]
    TooLarge,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    /// Offset of the entry within the TIFF structure.
    pos: usize,
    tag: u16,
    kind: u16,
    raw: [u8; ENTRY_LEN],
}

#[derive(Debug)]
struct Ifd {
    entries: Vec<Entry>,
    next: u32,
}

impl Ifd {
    fn orientation(&self) -> Option<&Entry> {
        self.entries.iter().find(|e| e.tag == ORIENTATION_TAG)
    }
}

/// Orientation tag of IFD0, `None` when the tag is absent or not an integer.
pub fn read_orientation(blob: &[u8]) -> Result<Option<u16>, ExifError> {
    let tiff = strip_marker(blob);
    match byte_order(tiff)? {
        Order::Little => read_value::<LittleEndian>(tiff),
        Order::Big => read_value::<BigEndian>(tiff),
    }
}

/// Copy of `blob` whose IFD0 orientation tag is `value`.
pub fn with_orientation(blob: &[u8], value: u16) -> Result<Vec<u8>, ExifError> {
    let tiff = strip_marker(blob);
    let marker = &blob[..blob.len() - tiff.len()];
    let rewritten = match byte_order(tiff)? {
        Order::Little => rewrite::<LittleEndian>(tiff, value)?,
        Order::Big => rewrite::<BigEndian>(tiff, value)?,
    };
    let mut out = Vec::with_capacity(marker.len() + rewritten.len());
    out.extend_from_slice(marker);
    out.extend_from_slice(&rewritten);
    Ok(out)
}

/// A little-endian blob holding only the orientation tag.
pub fn minimal(value: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    out.extend_from_slice(EXIF_MARKER);
    out.extend_from_slice(b"II");
    let mut tiff = [0u8; 24];
    LittleEndian::write_u16(&mut tiff[0..2], 42);
    LittleEndian::write_u32(&mut tiff[2..6], 8);
    LittleEndian::write_u16(&mut tiff[6..8], 1);
    LittleEndian::write_u16(&mut tiff[8..10], ORIENTATION_TAG);
    LittleEndian::write_u16(&mut tiff[10..12], TYPE_SHORT);
    LittleEndian::write_u32(&mut tiff[12..16], 1);
    LittleEndian::write_u16(&mut tiff[16..18], value);
    // value padding and the next-IFD offset stay zero
    out.extend_from_slice(&tiff);
    out
}

enum Order {
    Little,
    Big,
}

fn strip_marker(blob: &[u8]) -> &[u8] {
    blob.strip_prefix(EXIF_MARKER.as_slice()).unwrap_or(blob)
}

fn byte_order(tiff: &[u8]) -> Result<Order, ExifError> {
    let order = match tiff.get(0..2) {
        Some(b"II") => Order::Little,
        Some(b"MM") => Order::Big,
        _ => return Err(ExifError::NotTiff),
    };
    let magic = match order {
        Order::Little => tiff.get(2..4).map(LittleEndian::read_u16),
        Order::Big => tiff.get(2..4).map(BigEndian::read_u16),
    };
    if magic != Some(42) {
        return Err(ExifError::NotTiff);
    }
    Ok(order)
}

fn ifd0_offset<O: ByteOrder>(tiff: &[u8]) -> Result<u32, ExifError> {
    let mut cursor = Cursor::new(tiff);
    cursor.set_position(4);
    Ok(cursor.read_u32::<O>()?)
}

fn read_ifd<O: ByteOrder>(tiff: &[u8], offset: u32) -> Result<Ifd, ExifError> {
    let mut cursor = Cursor::new(tiff);
    cursor.set_position(u64::from(offset));
    let count = cursor.read_u16::<O>()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let pos = cursor.position() as usize;
        let mut raw = [0u8; ENTRY_LEN];
        cursor.read_exact(&mut raw)?;
        entries.push(Entry {
            pos,
            tag: O::read_u16(&raw[0..2]),
            kind: O::read_u16(&raw[2..4]),
            raw,
        });
    }
    // Some writers drop the trailing next-IFD offset of the last IFD.
    let next = cursor.read_u32::<O>().unwrap_or(0);
    Ok(Ifd { entries, next })
}

fn entry_value<O: ByteOrder>(entry: &Entry) -> Option<u16> {
    match entry.kind {
        TYPE_SHORT => Some(O::read_u16(&entry.raw[8..10])),
        TYPE_LONG => u16::try_from(O::read_u32(&entry.raw[8..12])).ok(),
        _ => None,
    }
}

fn read_value<O: ByteOrder>(tiff: &[u8]) -> Result<Option<u16>, ExifError> {
    let ifd = read_ifd::<O>(tiff, ifd0_offset::<O>(tiff)?)?;
    Ok(ifd.orientation().and_then(entry_value::<O>))
}

fn rewrite<O: ByteOrder>(tiff: &[u8], value: u16) -> Result<Vec<u8>, ExifError> {
    let ifd = read_ifd::<O>(tiff, ifd0_offset::<O>(tiff)?)?;
    let mut out = tiff.to_vec();

    if let Some(entry) = ifd.orientation() {
        let slot = &mut out[entry.pos..entry.pos + ENTRY_LEN];
        match entry.kind {
            TYPE_LONG => O::write_u32(&mut slot[8..12], u32::from(value)),
            TYPE_SHORT => O::write_u16(&mut slot[8..10], value),
            _ => {
                O::write_u16(&mut slot[2..4], TYPE_SHORT);
                O::write_u32(&mut slot[4..8], 1);
                O::write_u16(&mut slot[8..10], value);
                O::write_u16(&mut slot[10..12], 0);
            }
        }
        return Ok(out);
    }

    // No orientation entry: append a copy of IFD0 that has one.
    if out.len() % 2 == 1 {
        out.push(0);
    }
    let offset = u32::try_from(out.len()).map_err(|_| ExifError::TooLarge)?;
    let mut entry = [0u8; ENTRY_LEN];
    O::write_u16(&mut entry[0..2], ORIENTATION_TAG);
    O::write_u16(&mut entry[2..4], TYPE_SHORT);
    O::write_u32(&mut entry[4..8], 1);
    O::write_u16(&mut entry[8..10], value);

    let mut entries: Vec<(u16, [u8; ENTRY_LEN])> =
        ifd.entries.iter().map(|e| (e.tag, e.raw)).collect();
    entries.push((ORIENTATION_TAG, entry));
    entries.sort_by_key(|(tag, _)| *tag);
    let count = u16::try_from(entries.len()).map_err(|_| ExifError::TooLarge)?;

    out.write_u16::<O>(count)?;
    for (_, raw) in &entries {
        out.extend_from_slice(raw);
    }
    out.write_u32::<O>(ifd.next)?;
    O::write_u32(&mut out[4..8], offset);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Big-endian TIFF with IFD0 holding ImageWidth and, optionally, Orientation.
    fn motorola(orientation: Option<u16>) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(b"MM");
        t.write_u16::<BigEndian>(42).unwrap();
        t.write_u32::<BigEndian>(8).unwrap();
        let count = 1 + u16::from(orientation.is_some());
        t.write_u16::<BigEndian>(count).unwrap();
        // ImageWidth, SHORT, 1, 640
        t.write_u16::<BigEndian>(0x0100).unwrap();
        t.write_u16::<BigEndian>(TYPE_SHORT).unwrap();
        t.write_u32::<BigEndian>(1).unwrap();
        t.write_u16::<BigEndian>(640).unwrap();
        t.write_u16::<BigEndian>(0).unwrap();
        if let Some(o) = orientation {
            t.write_u16::<BigEndian>(ORIENTATION_TAG).unwrap();
            t.write_u16::<BigEndian>(TYPE_SHORT).unwrap();
            t.write_u32::<BigEndian>(1).unwrap();
            t.write_u16::<BigEndian>(o).unwrap();
            t.write_u16::<BigEndian>(0).unwrap();
        }
        t.write_u32::<BigEndian>(0).unwrap();
        t
    }

    #[test]
    fn minimal_blob_layout() {
        let blob = minimal(3);
        assert_eq!(blob.len(), 32);
        assert!(blob.starts_with(b"Exif\0\0II*\0"));
        assert_eq!(read_orientation(&blob).unwrap(), Some(3));
    }

    #[test]
    fn reads_both_byte_orders() {
        assert_eq!(read_orientation(&motorola(Some(6))).unwrap(), Some(6));
        assert_eq!(read_orientation(&motorola(None)).unwrap(), None);
        let little = minimal(8);
        assert_eq!(read_orientation(&little[6..]).unwrap(), Some(8));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            read_orientation(b"not exif at all"),
            Err(ExifError::NotTiff)
        ));
        assert!(matches!(
            read_orientation(b"II\x2b\x00\x08\x00\x00\x00"),
            Err(ExifError::NotTiff)
        ));
        // IFD0 points past the end
        assert!(matches!(
            read_orientation(b"II\x2a\x00\xff\x00\x00\x00"),
            Err(ExifError::Truncated(_))
        ));
    }

    #[test]
    fn rewrite_in_place_keeps_length() {
        let mut blob = EXIF_MARKER.to_vec();
        blob.extend(motorola(Some(6)));
        let out = with_orientation(&blob, 3).unwrap();
        assert_eq!(out.len(), blob.len());
        assert!(out.starts_with(EXIF_MARKER));
        assert_eq!(read_orientation(&out).unwrap(), Some(3));
    }

    #[test]
    fn rewrite_appends_missing_tag() {
        let blob = motorola(None);
        let out = with_orientation(&blob, 5).unwrap();
        // Only the IFD0 pointer in the header changes.
        assert_eq!(&out[..4], &blob[..4]);
        assert_eq!(&out[8..blob.len()], &blob[8..]);
        assert_eq!(BigEndian::read_u32(&out[4..8]) as usize, blob.len());
        assert_eq!(read_orientation(&out).unwrap(), Some(5));

        // Other tags survive, sorted before Orientation.
        let ifd = read_ifd::<BigEndian>(&out, ifd0_offset::<BigEndian>(&out).unwrap()).unwrap();
        let tags: Vec<u16> = ifd.entries.iter().map(|e| e.tag).collect();
        assert_eq!(tags, [0x0100, ORIENTATION_TAG]);
        assert_eq!(entry_value::<BigEndian>(&ifd.entries[0]), Some(640));
    }

    #[test]
    fn long_orientation_is_read_and_rewritten() {
        let mut t = minimal(1)[6..].to_vec();
        // retype the entry as LONG
        LittleEndian::write_u16(&mut t[12..14], TYPE_LONG);
        LittleEndian::write_u32(&mut t[18..22], 7);
        assert_eq!(read_orientation(&t).unwrap(), Some(7));
        let out = with_orientation(&t, 2).unwrap();
        assert_eq!(read_orientation(&out).unwrap(), Some(2));
    }
}
