use crate::err::{AxmlError, DecodeResult};
use crate::utils::ByteCursor;

use log::trace;
use serde::Serialize;
use std::fmt;

/// Size of the `ResChunk_header` prefix shared by every chunk.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// The `type` field of a chunk header.
///
/// Kinds this crate does not know are kept as `Unknown` so that the caller can skip them by
/// their declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChunkType {
    Null,
    StringPool,
    Table,
    Xml,
    XmlStartNamespace,
    XmlEndNamespace,
    XmlStartElement,
    XmlEndElement,
    XmlCdata,
    XmlResourceMap,
    Unknown(u16),
}

impl From<u16> for ChunkType {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => ChunkType::Null,
            0x0001 => ChunkType::StringPool,
            0x0002 => ChunkType::Table,
            0x0003 => ChunkType::Xml,
            0x0100 => ChunkType::XmlStartNamespace,
            0x0101 => ChunkType::XmlEndNamespace,
            0x0102 => ChunkType::XmlStartElement,
            0x0103 => ChunkType::XmlEndElement,
            0x0104 => ChunkType::XmlCdata,
            0x0180 => ChunkType::XmlResourceMap,
            other => ChunkType::Unknown(other),
        }
    }
}

impl ChunkType {
    pub fn as_u16(self) -> u16 {
        match self {
            ChunkType::Null => 0x0000,
            ChunkType::StringPool => 0x0001,
            ChunkType::Table => 0x0002,
            ChunkType::Xml => 0x0003,
            ChunkType::XmlStartNamespace => 0x0100,
            ChunkType::XmlEndNamespace => 0x0101,
            ChunkType::XmlStartElement => 0x0102,
            ChunkType::XmlEndElement => 0x0103,
            ChunkType::XmlCdata => 0x0104,
            ChunkType::XmlResourceMap => 0x0180,
            ChunkType::Unknown(raw) => raw,
        }
    }

    /// Node chunks (`ResXMLTree_node`) all share the `{lineNumber, comment}` header extension.
    pub fn is_xml_node(self) -> bool {
        matches!(
            self,
            ChunkType::XmlStartNamespace
                | ChunkType::XmlEndNamespace
                | ChunkType::XmlStartElement
                | ChunkType::XmlEndElement
                | ChunkType::XmlCdata
        )
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:04x})", self, self.as_u16())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    pub total_size: u32,
    /// Absolute offset of the first header byte.
    pub offset: usize,
}

impl ChunkHeader {
    /// Absolute offset one past the last byte of the chunk.
    pub fn end(&self) -> usize {
        self.offset + self.total_size as usize
    }

    /// Absolute offset of the chunk body.
    pub fn body_start(&self) -> usize {
        self.offset + usize::from(self.header_size)
    }
}

/// A validated chunk together with cursors over its parts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Chunk<'a> {
    pub header: ChunkHeader,
    /// `[offset + 8, offset + headerSize)`: the type specific header fields.
    pub header_ext: ByteCursor<'a>,
    /// `[offset + headerSize, offset + totalSize)`.
    pub body: ByteCursor<'a>,
}

impl<'a> Chunk<'a> {
    /// Read the chunk starting at the current position of `cursor`.
    ///
    /// The cursor itself is not advanced; callers move past the chunk with
    /// `cursor.advance(chunk.header.total_size as usize, ..)` once they are done with it.
    pub(crate) fn read(cursor: &ByteCursor<'a>) -> DecodeResult<Chunk<'a>> {
        let mut peek = *cursor;
        let offset = peek.pos();
        let remaining = peek.remaining();

        let chunk_type = ChunkType::from(peek.u16_named("chunk type")?);
        let header_size = peek.u16_named("chunk header size")?;
        let total_size = peek.u32_named("chunk size")?;

        if usize::from(header_size) < CHUNK_HEADER_SIZE {
            return Err(AxmlError::malformed_chunk(
                offset,
                format!("{chunk_type} declares header size {header_size}, smaller than {CHUNK_HEADER_SIZE}"),
            ));
        }

        if total_size < u32::from(header_size) {
            return Err(AxmlError::malformed_chunk(
                offset,
                format!("{chunk_type} declares size {total_size}, smaller than its header size {header_size}"),
            ));
        }

        let total = usize::try_from(total_size).map_err(|_| {
            AxmlError::malformed_chunk(offset, format!("{chunk_type} size {total_size} overflows"))
        })?;
        if total > remaining {
            return Err(AxmlError::malformed_chunk(
                offset,
                format!("{chunk_type} declares size {total_size}, but only {remaining} bytes remain"),
            ));
        }

        let header = ChunkHeader {
            chunk_type,
            header_size,
            total_size,
            offset,
        };
        trace!("Chunk header at {offset}: {header:?}");

        let header_ext = cursor.sub_cursor(offset + CHUNK_HEADER_SIZE, header.body_start(), "chunk header")?;
        let body = cursor.sub_cursor(header.body_start(), header.end(), "chunk body")?;

        Ok(Chunk {
            header,
            header_ext,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::ErrorKind;

    fn header(chunk_type: u16, header_size: u16, total_size: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&chunk_type.to_le_bytes());
        out.extend_from_slice(&header_size.to_le_bytes());
        out.extend_from_slice(&total_size.to_le_bytes());
        out
    }

    #[test]
    fn test_parses_chunk_and_scopes_cursors() {
        let mut buf = header(0x0180, 8, 16);
        buf.extend_from_slice(&[1, 0, 1, 1, 2, 0, 1, 1]);
        buf.extend_from_slice(&[0xaa; 4]);

        let cursor = ByteCursor::new(&buf);
        let chunk = Chunk::read(&cursor).unwrap();

        assert_eq!(
            chunk.header,
            ChunkHeader {
                chunk_type: ChunkType::XmlResourceMap,
                header_size: 8,
                total_size: 16,
                offset: 0,
            }
        );
        assert_eq!(chunk.header.end(), 16);
        assert_eq!(chunk.header_ext.remaining(), 0);
        assert_eq!(chunk.body.start(), 8);
        assert_eq!(chunk.body.end(), 16);
        // The outer cursor is left untouched.
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn test_header_extension_is_exposed() {
        let mut buf = header(0x0102, 16, 24);
        buf.extend_from_slice(&7_u32.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(&[0; 8]);

        let chunk = Chunk::read(&ByteCursor::new(&buf)).unwrap();
        let mut ext = chunk.header_ext;
        assert_eq!(chunk.header.chunk_type, ChunkType::XmlStartElement);
        assert_eq!(ext.u32_named("line").unwrap(), 7);
        assert_eq!(ext.u32_named("comment").unwrap(), u32::MAX);
        assert_eq!(chunk.body.remaining(), 8);
    }

    #[test]
    fn test_rejects_size_past_end_of_buffer() {
        let mut buf = header(0x0001, 28, 1000);
        buf.resize(40, 0);
        let err = Chunk::read(&ByteCursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedChunk);
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn test_rejects_inconsistent_sizes() {
        let buf = header(0x0001, 4, 8);
        assert_eq!(
            Chunk::read(&ByteCursor::new(&buf)).unwrap_err().kind(),
            ErrorKind::MalformedChunk
        );

        let mut buf = header(0x0001, 28, 16);
        buf.resize(28, 0);
        assert_eq!(
            Chunk::read(&ByteCursor::new(&buf)).unwrap_err().kind(),
            ErrorKind::MalformedChunk
        );
    }

    #[test]
    fn test_short_header_is_out_of_bounds() {
        let buf = [0x01, 0x00, 0x1c];
        assert_eq!(
            Chunk::read(&ByteCursor::new(&buf)).unwrap_err().kind(),
            ErrorKind::OutOfBounds
        );
    }

    #[test]
    fn test_unknown_types_round_trip_their_raw_value() {
        assert_eq!(ChunkType::from(0x0203), ChunkType::Unknown(0x0203));
        assert_eq!(ChunkType::from(0x0203).as_u16(), 0x0203);
        assert_eq!(ChunkType::from(0x0104), ChunkType::XmlCdata);
        assert!(ChunkType::XmlCdata.is_xml_node());
        assert!(!ChunkType::StringPool.is_xml_node());
        assert_eq!(ChunkType::Xml.to_string(), "Xml(0x0003)");
    }
}
