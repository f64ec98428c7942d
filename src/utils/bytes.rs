//! Byte-slice utilities for bounds-oriented parsing.
//!
//! There are two layers:
//! - **Option layer** (`read_*`): helpers that return `Option<T>`.
//! - **Result layer** (`*_r`): wrappers that map `None` to `AxmlError::OutOfBounds`.
//!
//! Design notes:
//! - All numeric reads are **little-endian** (AXML is LE on every platform), assembled through
//!   `byteorder::LittleEndian` so the host byte order never leaks in.
//! - Offsets are `usize` and are interpreted relative to the slice you pass in.

use byteorder::{ByteOrder, LittleEndian};

use crate::err::AxmlError;

/// Read `N` raw bytes at `offset`.
///
/// Returns `None` if the range is out of bounds.
pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    let bytes: [u8; N] = buf.get(offset..end)?.try_into().ok()?;
    Some(bytes)
}

/// Read a single byte at `offset`.
pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a `u16` (little-endian) at `offset`.
pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    Some(LittleEndian::read_u16(&read_array::<2>(buf, offset)?))
}

/// Read a `u32` (little-endian) at `offset`.
pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    Some(LittleEndian::read_u32(&read_array::<4>(buf, offset)?))
}

#[inline]
pub(crate) fn out_of_bounds(what: &'static str, offset: usize, need: usize, len: usize) -> AxmlError {
    AxmlError::OutOfBounds {
        what,
        offset: offset as u64,
        need,
        have: len.saturating_sub(offset),
    }
}

pub(crate) fn slice_r<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], AxmlError> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| out_of_bounds(what, offset, len, buf.len()))?;
    buf.get(offset..end)
        .ok_or_else(|| out_of_bounds(what, offset, len, buf.len()))
}

/// Read a `u16` (little-endian) at `offset`, or return `AxmlError::OutOfBounds`.
pub(crate) fn read_u16_le_r(buf: &[u8], offset: usize, what: &'static str) -> Result<u16, AxmlError> {
    read_u16_le(buf, offset).ok_or_else(|| out_of_bounds(what, offset, 2, buf.len()))
}

/// Read a `u32` (little-endian) at `offset`, or return `AxmlError::OutOfBounds`.
pub(crate) fn read_u32_le_r(buf: &[u8], offset: usize, what: &'static str) -> Result<u32, AxmlError> {
    read_u32_le(buf, offset).ok_or_else(|| out_of_bounds(what, offset, 4, buf.len()))
}

/// Read a `count`-element `u32` (little-endian) table at `offset`.
///
/// This does a single bounds check for the whole table and then decodes each element.
pub(crate) fn read_u32_vec_le_r(
    buf: &[u8],
    offset: usize,
    count: usize,
    what: &'static str,
) -> Result<Vec<u32>, AxmlError> {
    let bytes = count
        .checked_mul(4)
        .ok_or_else(|| out_of_bounds(what, offset, usize::MAX, buf.len()))?;
    let table = slice_r(buf, offset, bytes, what)?;

    let mut out = vec![0_u32; count];
    LittleEndian::read_u32_into(table, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_little_endian() {
        let buf = [0x03, 0x00, 0x08, 0x00, 0xff];
        assert_eq!(read_u16_le(&buf, 0), Some(0x0003));
        assert_eq!(read_u32_le(&buf, 0), Some(0x0008_0003));
        assert_eq!(read_u32_le(&buf, 2), None);
        assert_eq!(read_u8(&buf, 4), Some(0xff));
    }

    #[test]
    fn test_slice_r_reports_missing_bytes() {
        let buf = [0_u8; 6];
        let err = slice_r(&buf, 4, 4, "probe").unwrap_err();
        assert_eq!(
            err,
            AxmlError::OutOfBounds {
                what: "probe",
                offset: 4,
                need: 4,
                have: 2,
            }
        );
        assert!(slice_r(&buf, usize::MAX, 2, "overflow").is_err());
    }

    #[test]
    fn test_read_u32_table() {
        let buf = [1, 0, 0, 0, 2, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(
            read_u32_vec_le_r(&buf, 0, 3, "table").unwrap(),
            vec![1, 2, 0xffff_ffff]
        );
        assert!(read_u32_vec_le_r(&buf, 4, 3, "table").is_err());
        assert!(read_u32_vec_le_r(&buf, 0, usize::MAX, "table").is_err());
    }
}
