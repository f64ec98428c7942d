use crate::axml_parser::DecoderSettings;
use crate::chunk_header::Chunk;
use crate::err::{AxmlError, DecodeResult, ErrorKind};
use crate::utils::ByteCursor;

use bitflags::bitflags;
use log::{debug, trace};
use serde::Serialize;

/// Marks an absent string reference (`ResStringPool_ref` with `index == -1`).
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;

/// Terminates a span list (`ResStringPool_span::END`).
pub const SPAN_END: u32 = 0xFFFF_FFFF;

/// `ResStringPool_header`: the 8 byte chunk header followed by five `u32` fields.
pub const STRING_POOL_HEADER_SIZE: usize = 28;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct StringPoolFlags: u32 {
        /// Strings are sorted by their UTF-16 value.
        const SORTED = 0x0000_0001;
        /// Strings are stored as (modified) UTF-8 instead of UTF-16.
        const UTF8 = 0x0000_0100;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: StringPoolFlags,
    /// Offset of the string data, relative to the start of the chunk.
    pub strings_start: u32,
    /// Offset of the style data, relative to the start of the chunk. Zero when absent.
    pub styles_start: u32,
}

/// A formatting span (`ResStringPool_span`) applied to a range of characters of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StyleSpan {
    /// Index into the pool of the span's tag name (e.g. `b`, `i`).
    pub name_index: u32,
    pub first_char: u32,
    /// Inclusive.
    pub last_char: u32,
}

/// The decoded `StringPool` chunk.
///
/// Every string is decoded eagerly and owned by the pool, so the pool (and the document
/// holding it) does not borrow from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringPool {
    pub header: StringPoolHeader,
    /// Entry offsets relative to `strings_start`.
    pub offsets: Vec<u32>,
    /// Span list offsets relative to `styles_start`.
    pub style_offsets: Vec<u32>,
    strings: Vec<String>,
    styles: Vec<Vec<StyleSpan>>,
}

impl Default for StringPool {
    fn default() -> Self {
        StringPool {
            header: StringPoolHeader {
                string_count: 0,
                style_count: 0,
                flags: StringPoolFlags::empty(),
                strings_start: 0,
                styles_start: 0,
            },
            offsets: Vec::new(),
            style_offsets: Vec::new(),
            strings: Vec::new(),
            styles: Vec::new(),
        }
    }
}

impl StringPool {
    pub(crate) fn from_chunk(chunk: &Chunk<'_>, settings: &DecoderSettings) -> DecodeResult<Self> {
        let chunk_start = chunk.header.offset;
        let chunk_end = chunk.header.end();

        if usize::from(chunk.header.header_size) < STRING_POOL_HEADER_SIZE {
            return Err(AxmlError::malformed_chunk(
                chunk_start,
                format!(
                    "string pool header size {} is smaller than {STRING_POOL_HEADER_SIZE}",
                    chunk.header.header_size
                ),
            ));
        }

        let mut ext = chunk.header_ext;
        let string_count = ext.u32_named("string pool string count")?;
        let style_count = ext.u32_named("string pool style count")?;
        let flags = StringPoolFlags::from_bits_retain(ext.u32_named("string pool flags")?);
        let strings_start = ext.u32_named("string pool strings start")?;
        let styles_start = ext.u32_named("string pool styles start")?;

        let header = StringPoolHeader {
            string_count,
            style_count,
            flags,
            strings_start,
            styles_start,
        };
        debug!("String pool at {chunk_start}: {header:?}");

        let mut body = chunk.body;
        let offsets_pos = body.pos();
        let offsets = body
            .u32_table(string_count as usize, "string offsets")
            .map_err(|e| Self::table_error(e, chunk_start, "string offset table"))?;
        let style_offsets = body
            .u32_table(style_count as usize, "style offsets")
            .map_err(|e| Self::table_error(e, chunk_start, "style offset table"))?;
        let tables_end = body.pos();

        let total_size = chunk.header.total_size as usize;
        let tables_rel = tables_end - chunk_start;
        let has_styles = style_count > 0 && styles_start != 0;

        if string_count > 0 && !(tables_rel..=total_size).contains(&(strings_start as usize)) {
            return Err(AxmlError::malformed_chunk(
                chunk_start,
                format!("strings start {strings_start} lies outside [{tables_rel}, {total_size}]"),
            ));
        }
        if has_styles {
            let lower = if string_count > 0 {
                strings_start as usize
            } else {
                tables_rel
            };
            if !(lower..=total_size).contains(&(styles_start as usize)) {
                return Err(AxmlError::malformed_chunk(
                    chunk_start,
                    format!("styles start {styles_start} lies outside [{lower}, {total_size}]"),
                ));
            }
        }

        let utf8 = flags.contains(StringPoolFlags::UTF8);
        let mut strings = Vec::with_capacity(offsets.len());
        if string_count > 0 {
            let data_start = chunk_start + strings_start as usize;
            let data_end = if has_styles {
                chunk_start + styles_start as usize
            } else {
                chunk_end
            };
            let data = body.sub_cursor(data_start, data_end, "string data")?;

            for (index, &offset) in offsets.iter().enumerate() {
                let entry_pos = offsets_pos + index * 4;
                let text = Self::read_entry(&data, entry_pos, offset, utf8, settings)?;
                trace!("\tstring[{index}] = {text:?}");
                strings.push(text);
            }
        }

        let styles = if has_styles && settings.should_parse_styles() {
            let region = body.sub_cursor(chunk_start + styles_start as usize, chunk_end, "style data")?;
            let mut styles = Vec::with_capacity(style_offsets.len());
            for (index, &offset) in style_offsets.iter().enumerate() {
                styles.push(Self::read_spans(&region, index, offset)?);
            }
            styles
        } else {
            Vec::new()
        };

        Ok(StringPool {
            header,
            offsets,
            style_offsets,
            strings,
            styles,
        })
    }

    /// A table that does not fit its chunk is a chunk level problem, not a buffer overrun.
    fn table_error(err: AxmlError, chunk_start: usize, what: &str) -> AxmlError {
        match err.kind() {
            ErrorKind::OutOfBounds => {
                AxmlError::malformed_chunk(chunk_start, format!("{what} does not fit in the chunk"))
            }
            _ => err,
        }
    }

    fn read_entry(
        data: &ByteCursor<'_>,
        entry_pos: usize,
        offset: u32,
        utf8: bool,
        settings: &DecoderSettings,
    ) -> DecodeResult<String> {
        let region_len = data.end() - data.start();
        if offset as usize >= region_len {
            return Err(AxmlError::malformed_string(
                entry_pos,
                format!("string offset {offset} escapes the string data region of {region_len} bytes"),
            ));
        }

        let mut cursor = *data;
        cursor.set_pos(data.start() + offset as usize, "string entry")?;
        let start = cursor.pos();

        let decoded = if utf8 {
            Self::read_utf8(&mut cursor, settings)
        } else {
            Self::read_utf16(&mut cursor, settings)
        };

        // Inside the pool a declared length that overruns the region is a string problem.
        decoded.map_err(|err| match err {
            AxmlError::OutOfBounds { what, need, have, .. } => AxmlError::malformed_string(
                start,
                format!("{what} needs {need} bytes, but only {have} remain in the string data"),
            ),
            other => other,
        })
    }

    /// `u8` length, or two bytes with the high bit of the first one set.
    fn read_utf8_length(cursor: &mut ByteCursor<'_>, what: &'static str) -> DecodeResult<usize> {
        let first = cursor.u8_named(what)?;
        if first & 0x80 == 0 {
            return Ok(usize::from(first));
        }
        let second = cursor.u8_named(what)?;
        Ok((usize::from(first & 0x7F) << 8) | usize::from(second))
    }

    /// `u16` length, or two `u16`s with the high bit of the first one set.
    fn read_utf16_length(cursor: &mut ByteCursor<'_>, what: &'static str) -> DecodeResult<usize> {
        let first = cursor.u16_named(what)?;
        if first & 0x8000 == 0 {
            return Ok(usize::from(first));
        }
        let second = cursor.u16_named(what)?;
        Ok((usize::from(first & 0x7FFF) << 16) | usize::from(second))
    }

    fn read_utf8(cursor: &mut ByteCursor<'_>, settings: &DecoderSettings) -> DecodeResult<String> {
        let start = cursor.pos();
        // The UTF-16 length is informational only.
        let _utf16_len = Self::read_utf8_length(cursor, "utf-8 string char count")?;
        let byte_len = Self::read_utf8_length(cursor, "utf-8 string byte count")?;
        let raw = cursor.take_bytes(byte_len, "utf-8 string data")?;

        let text = match std::str::from_utf8(raw) {
            Ok(text) => text.to_owned(),
            Err(_) => cesu8::from_java_cesu8(raw)
                .map(|text| text.into_owned())
                .map_err(|_| AxmlError::malformed_string(start, "invalid UTF-8 string data"))?,
        };

        match cursor.u8_named("utf-8 string terminator") {
            Ok(0) => {}
            Ok(other) if settings.has_strict_terminators() => {
                return Err(AxmlError::malformed_string(
                    start,
                    format!("expected NUL terminator, found 0x{other:02x}"),
                ));
            }
            Err(err) if settings.has_strict_terminators() => return Err(err),
            _ => trace!("UTF-8 string at {start} has no terminator"),
        }

        Ok(text)
    }

    fn read_utf16(cursor: &mut ByteCursor<'_>, settings: &DecoderSettings) -> DecodeResult<String> {
        let start = cursor.pos();
        let char_count = Self::read_utf16_length(cursor, "utf-16 string char count")?;
        let text = cursor.utf16_string(char_count, "utf-16 string data")?;

        match cursor.u16_named("utf-16 string terminator") {
            Ok(0) => {}
            Ok(other) if settings.has_strict_terminators() => {
                return Err(AxmlError::malformed_string(
                    start,
                    format!("expected NUL terminator, found 0x{other:04x}"),
                ));
            }
            Err(err) if settings.has_strict_terminators() => return Err(err),
            _ => trace!("UTF-16 string at {start} has no terminator"),
        }

        Ok(text)
    }

    fn read_spans(region: &ByteCursor<'_>, index: usize, offset: u32) -> DecodeResult<Vec<StyleSpan>> {
        let region_len = region.end() - region.start();
        if offset as usize >= region_len {
            return Err(AxmlError::malformed_string(
                region.start(),
                format!("style {index} offset {offset} escapes the style region of {region_len} bytes"),
            ));
        }

        let mut cursor = *region;
        cursor.set_pos(region.start() + offset as usize, "style spans")?;
        let start = cursor.pos();

        let mut spans = Vec::new();
        loop {
            let name_index = cursor.u32_named("style span name").map_err(|_| {
                AxmlError::malformed_string(start, format!("style {index} is missing its end marker"))
            })?;
            if name_index == SPAN_END {
                break;
            }
            let first_char = cursor.u32_named("style span first char");
            let last_char = cursor.u32_named("style span last char");
            let (Ok(first_char), Ok(last_char)) = (first_char, last_char) else {
                return Err(AxmlError::malformed_string(
                    start,
                    format!("style {index} has a truncated span"),
                ));
            };
            spans.push(StyleSpan {
                name_index,
                first_char,
                last_char,
            });
        }

        trace!("\tstyle[{index}] = {spans:?}");
        Ok(spans)
    }

    /// The string at `index`, or `None` for [`NO_ENTRY`] and out of range indices.
    pub fn get(&self, index: u32) -> Option<&str> {
        if index == NO_ENTRY {
            return None;
        }
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Span list of the string at `index`. Strings without styling have an empty list.
    pub fn styles_for(&self, index: u32) -> &[StyleSpan] {
        self.styles
            .get(index as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn styles(&self) -> &[Vec<StyleSpan>] {
        &self.styles
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.header.flags.contains(StringPoolFlags::UTF8)
    }

    pub fn is_sorted(&self) -> bool {
        self.header.flags.contains(StringPoolFlags::SORTED)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Position of the first entry equal to `text`.
    pub fn position(&self, text: &str) -> Option<u32> {
        self.strings
            .iter()
            .position(|s| s == text)
            .map(|i| i as u32)
    }
}
