use crate::err::{AxmlError, DecodeResult};
use crate::utils::bytes;
use crate::utils::decode_utf16le_bytes;

/// A lightweight cursor over an immutable byte slice.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`, restricted to a window
/// `[start, end)` of the backing buffer. Positions are always **absolute** offsets into the
/// backing buffer, so errors raised while decoding a nested chunk still point at the right
/// byte of the original document.
///
/// All reads are little-endian and advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start: 0,
            end: buf.len(),
            pos: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_pos(buf: &'a [u8], pos: usize) -> DecodeResult<Self> {
        // Allow pos == len (EOF), reject pos > len.
        let _ = bytes::slice_r(buf, pos, 0, "cursor.position")?;
        Ok(Self {
            buf,
            start: pos,
            end: buf.len(),
            pos,
        })
    }

    /// A new cursor limited to `[start, end)`, which must lie inside this cursor's window.
    pub(crate) fn sub_cursor(
        &self,
        start: usize,
        end: usize,
        what: &'static str,
    ) -> DecodeResult<ByteCursor<'a>> {
        if start < self.start || start > end || end > self.end {
            return Err(bytes::out_of_bounds(
                what,
                start,
                end.saturating_sub(start),
                self.end,
            ));
        }
        Ok(ByteCursor {
            buf: self.buf,
            start,
            end,
            pos: start,
        })
    }

    /// The readable window of the backing buffer.
    #[inline]
    fn view(&self) -> &'a [u8] {
        &self.buf[..self.end]
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub(crate) fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    pub(crate) fn set_pos(&mut self, pos: usize, what: &'static str) -> DecodeResult<()> {
        if pos < self.start {
            return Err(bytes::out_of_bounds(what, pos, 0, self.end));
        }
        let _ = bytes::slice_r(self.view(), pos, 0, what)?;
        self.pos = pos;
        Ok(())
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize, what: &'static str) -> DecodeResult<()> {
        let new_pos = self
            .pos
            .checked_add(n)
            .ok_or_else(|| bytes::out_of_bounds(what, self.pos, n, self.end))?;
        if new_pos > self.end {
            return Err(bytes::out_of_bounds(what, self.pos, n, self.end));
        }
        self.pos = new_pos;
        Ok(())
    }

    #[inline]
    pub(crate) fn take_bytes(&mut self, len: usize, what: &'static str) -> DecodeResult<&'a [u8]> {
        let out = bytes::slice_r(self.view(), self.pos, len, what)?;
        self.pos += len;
        Ok(out)
    }

    #[inline]
    pub(crate) fn u8_named(&mut self, what: &'static str) -> DecodeResult<u8> {
        let b = bytes::read_u8(self.view(), self.pos)
            .ok_or_else(|| bytes::out_of_bounds(what, self.pos, 1, self.end))?;
        self.pos += 1;
        Ok(b)
    }

    #[inline]
    pub(crate) fn u16_named(&mut self, what: &'static str) -> DecodeResult<u16> {
        let v = bytes::read_u16_le_r(self.view(), self.pos, what)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub(crate) fn u32_named(&mut self, what: &'static str) -> DecodeResult<u32> {
        let v = bytes::read_u32_le_r(self.view(), self.pos, what)?;
        self.pos += 4;
        Ok(v)
    }

    /// Read a table of `count` consecutive little-endian `u32` values.
    pub(crate) fn u32_table(&mut self, count: usize, what: &'static str) -> DecodeResult<Vec<u32>> {
        let out = bytes::read_u32_vec_le_r(self.view(), self.pos, count, what)?;
        self.pos += count * 4;
        Ok(out)
    }

    /// Read exactly `char_count` UTF-16 code units (little-endian) and decode them.
    ///
    /// Unlike C-style readers this does not stop at a NUL code unit; the declared length wins.
    pub(crate) fn utf16_string(&mut self, char_count: usize, what: &'static str) -> DecodeResult<String> {
        let start = self.pos;
        let byte_len = char_count
            .checked_mul(2)
            .ok_or_else(|| bytes::out_of_bounds(what, start, usize::MAX, self.end))?;
        let raw = self.take_bytes(byte_len, what)?;
        decode_utf16le_bytes(raw).map_err(|_| {
            AxmlError::malformed_string(start, format!("{what}: invalid UTF-16 data"))
        })
    }
}
