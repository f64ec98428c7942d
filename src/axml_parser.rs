use crate::chunk_header::{CHUNK_HEADER_SIZE, Chunk, ChunkType};
use crate::document::ManifestDocument;
use crate::err::{AxmlError, DecodeResult};
use crate::resource_map::ResourceMap;
use crate::string_pool::StringPool;
use crate::tree_builder::TreeBuilder;
use crate::utils::{ByteCursor, bytes};

use log::debug;

#[cfg(feature = "multithreading")]
use rayon::prelude::*;

/// The first four bytes of every binary XML document: chunk type `Xml` (3) with an 8 byte header.
pub const AXML_MAGIC: u32 = 0x0008_0003;

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderSettings {
    /// Decode style spans attached to string pool entries.
    parse_styles: bool,
    /// Reject string pool entries whose NUL terminator is missing.
    strict_terminators: bool,
    /// Maximum element nesting accepted before the document is rejected.
    max_depth: usize,
    /// Threads used by `decode_many`; `0` lets rayon decide.
    num_threads: usize,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        DecoderSettings {
            parse_styles: true,
            strict_terminators: false,
            max_depth: DEFAULT_MAX_DEPTH,
            num_threads: 0,
        }
    }
}

impl DecoderSettings {
    pub fn new() -> Self {
        DecoderSettings::default()
    }

    pub fn parse_styles(mut self, parse_styles: bool) -> Self {
        self.parse_styles = parse_styles;
        self
    }

    pub fn strict_terminators(mut self, strict_terminators: bool) -> Self {
        self.strict_terminators = strict_terminators;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the number of worker threads used by [`decode_many`].
    /// `0` will let rayon decide.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = if cfg!(feature = "multithreading") {
            num_threads
        } else {
            1
        };
        self
    }

    pub fn should_parse_styles(&self) -> bool {
        self.parse_styles
    }

    pub fn has_strict_terminators(&self) -> bool {
        self.strict_terminators
    }

    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn get_num_threads(&self) -> usize {
        self.num_threads
    }
}

/// Decodes a single binary XML buffer.
///
/// ```no_run
/// let bytes = std::fs::read("AndroidManifest.xml")?;
/// let doc = axml::AxmlParser::from_buffer(&bytes).parse()?;
/// println!("{:?}", doc.package_name());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct AxmlParser<'a> {
    data: &'a [u8],
    settings: DecoderSettings,
}

impl<'a> AxmlParser<'a> {
    pub fn from_buffer(data: &'a [u8]) -> Self {
        AxmlParser {
            data,
            settings: DecoderSettings::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: DecoderSettings) -> Self {
        self.settings = configuration;
        self
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    pub fn parse(&self) -> DecodeResult<ManifestDocument> {
        let data = self.data;
        let magic = bytes::read_u32_le_r(data, 0, "file magic")?;
        if magic != AXML_MAGIC {
            return Err(AxmlError::UnsupportedMagicNumber {
                offset: 0,
                magic,
                expected: AXML_MAGIC,
            });
        }

        let file = Chunk::read(&ByteCursor::new(data))?;
        let file_size = file.header.total_size;
        if file.header.end() < data.len() {
            debug!(
                "Ignoring {} trailing bytes after the document",
                data.len() - file.header.end()
            );
        }
        debug!(
            "Decoding binary XML document of {} bytes (header size {})",
            file_size, file.header.header_size
        );

        let mut cursor = file.body;
        let mut string_pool: Option<StringPool> = None;
        let mut resource_map: Option<ResourceMap> = None;
        let mut builder = TreeBuilder::new(&self.settings);

        while !cursor.is_empty() {
            if cursor.remaining() < CHUNK_HEADER_SIZE {
                debug!(
                    "Ignoring {} bytes at {} that cannot hold a chunk header",
                    cursor.remaining(),
                    cursor.pos()
                );
                break;
            }

            let chunk = Chunk::read(&cursor)?;
            let offset = chunk.header.offset;

            match chunk.header.chunk_type {
                ChunkType::StringPool => {
                    if string_pool.is_some() {
                        return Err(AxmlError::malformed_chunk(
                            offset,
                            "document contains more than one string pool",
                        ));
                    }
                    let pool = StringPool::from_chunk(&chunk, &self.settings)?;
                    debug!(
                        "String pool at {offset}: {} strings, {} styles, utf8: {}",
                        pool.len(),
                        pool.header.style_count,
                        pool.is_utf8()
                    );
                    string_pool = Some(pool);
                }
                ChunkType::XmlResourceMap => {
                    let string_count = string_pool.as_ref().map_or(0, StringPool::len);
                    let map = ResourceMap::from_chunk(&chunk, string_count)?;
                    debug!("Resource map at {offset}: {} ids", map.len());
                    if resource_map.replace(map).is_some() {
                        debug!("Resource map at {offset} replaces an earlier one");
                    }
                }
                node if node.is_xml_node() => {
                    let Some(pool) = string_pool.as_ref() else {
                        return Err(AxmlError::malformed_chunk(
                            offset,
                            format!("{node} appears before the string pool"),
                        ));
                    };
                    builder.feed(&chunk, pool)?;
                }
                other => {
                    debug!(
                        "Skipping {other} chunk of {} bytes at {offset}",
                        chunk.header.total_size
                    );
                }
            }

            cursor.advance(chunk.header.total_size as usize, "chunk")?;
        }

        let tree = builder.finish(cursor.pos())?;

        Ok(ManifestDocument {
            magic_number: magic,
            file_size,
            string_pool: string_pool.unwrap_or_default(),
            resource_map,
            namespaces: tree.namespaces,
            root: tree.root,
        })
    }
}

/// Decode `data` with the default settings.
pub fn decode(data: &[u8]) -> DecodeResult<ManifestDocument> {
    AxmlParser::from_buffer(data).parse()
}

pub fn decode_with_settings(
    data: &[u8],
    settings: &DecoderSettings,
) -> DecodeResult<ManifestDocument> {
    AxmlParser::from_buffer(data)
        .with_configuration(settings.clone())
        .parse()
}

/// Decode independent buffers, in parallel when the `multithreading` feature is enabled.
///
/// Results are returned in input order.
pub fn decode_many<B>(buffers: &[B], settings: &DecoderSettings) -> Vec<DecodeResult<ManifestDocument>>
where
    B: AsRef<[u8]> + Sync,
{
    #[cfg(feature = "multithreading")]
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.get_num_threads())
            .build();

        match pool {
            Ok(pool) => {
                return pool.install(|| {
                    buffers
                        .par_iter()
                        .map(|buffer| decode_with_settings(buffer.as_ref(), settings))
                        .collect()
                });
            }
            Err(e) => debug!("Failed to build a thread pool ({e}), decoding sequentially"),
        }
    }

    buffers
        .iter()
        .map(|buffer| decode_with_settings(buffer.as_ref(), settings))
        .collect()
}
