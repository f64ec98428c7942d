use crate::axml_parser::DecoderSettings;
use crate::chunk_header::{Chunk, ChunkType};
use crate::err::{AxmlError, DecodeResult};
use crate::model::{Attribute, CData, Element, Namespace};
use crate::string_pool::{NO_ENTRY, StringPool};
use crate::utils::ByteCursor;
use crate::value::{DataType, TYPED_VALUE_SIZE, TypedValue};

use log::trace;

/// `ResXMLTree_node`: chunk header plus `lineNumber` and `comment`.
pub const NODE_HEADER_SIZE: usize = 16;

/// `ResXMLTree_attribute` without the trailing `Res_value`.
const ATTRIBUTE_FIXED_SIZE: usize = 12;

/// Builds the element tree from the flat, pre-order stream of node chunks.
///
/// In-progress elements live on an explicit stack; an element is attached to its parent
/// (or becomes the root) when its end chunk is seen.
#[derive(Debug)]
pub(crate) struct TreeBuilder<'s> {
    settings: &'s DecoderSettings,
    /// Namespaces currently in scope, innermost last, with the element depth they opened at.
    scopes: Vec<(Namespace, usize)>,
    /// Declarations not yet attached to an element.
    pending: Vec<Namespace>,
    /// Every declaration, in document order.
    declared: Vec<Namespace>,
    stack: Vec<Element>,
    root: Option<Element>,
}

#[derive(Debug)]
pub(crate) struct Tree {
    pub root: Option<Element>,
    pub namespaces: Vec<Namespace>,
}

impl<'s> TreeBuilder<'s> {
    pub(crate) fn new(settings: &'s DecoderSettings) -> Self {
        TreeBuilder {
            settings,
            scopes: Vec::new(),
            pending: Vec::new(),
            declared: Vec::new(),
            stack: Vec::new(),
            root: None,
        }
    }

    /// Consume a single node chunk.
    pub(crate) fn feed(&mut self, chunk: &Chunk<'_>, pool: &StringPool) -> DecodeResult<()> {
        let offset = chunk.header.offset;
        if usize::from(chunk.header.header_size) < NODE_HEADER_SIZE {
            return Err(AxmlError::malformed_chunk(
                offset,
                format!(
                    "{} header size {} is smaller than {NODE_HEADER_SIZE}",
                    chunk.header.chunk_type, chunk.header.header_size
                ),
            ));
        }

        let mut ext = chunk.header_ext;
        let line_number = ext.u32_named("node line number")?;
        let comment = ext.u32_named("node comment")?;
        let resolver = Resolver { pool };
        let comment_index = resolver.optional(comment, ext.pos() - 4, "node comment")?;

        let mut body = chunk.body;
        match chunk.header.chunk_type {
            ChunkType::XmlStartNamespace => {
                let namespace = Self::read_namespace(&mut body, &resolver, line_number)?;
                trace!("Start namespace at {offset}: {namespace:?}");
                self.scopes.push((namespace.clone(), self.stack.len()));
                self.pending.push(namespace.clone());
                self.declared.push(namespace);
            }
            ChunkType::XmlEndNamespace => {
                let namespace = Self::read_namespace(&mut body, &resolver, line_number)?;
                trace!("End namespace at {offset}: {namespace:?}");
                self.end_namespace(offset, &namespace)?;
            }
            ChunkType::XmlStartElement => {
                let element =
                    Self::read_start_element(&mut body, &resolver, line_number, comment_index)?;
                self.start_element(offset, element)?;
            }
            ChunkType::XmlEndElement => {
                let namespace_index =
                    resolver.optional_at(&mut body, "end element namespace")?;
                let name_index = resolver.required_at(&mut body, "end element name")?;
                self.end_element(offset, namespace_index, name_index)?;
            }
            ChunkType::XmlCdata => {
                let data_index = resolver.optional_at(&mut body, "cdata data")?;
                let typed_value = resolver.typed_value(&mut body)?;
                let cdata = CData {
                    data_index,
                    typed_value,
                    line_number,
                };
                trace!("CDATA at {offset}: {cdata:?}");
                match self.stack.last_mut() {
                    Some(parent) => parent.text.push(cdata),
                    None => {
                        return Err(AxmlError::unbalanced_element(
                            offset,
                            "character data outside of any element",
                        ));
                    }
                }
            }
            other => {
                return Err(AxmlError::malformed_chunk(
                    offset,
                    format!("{other} is not an XML node chunk"),
                ));
            }
        }

        Ok(())
    }

    fn read_namespace(
        body: &mut ByteCursor<'_>,
        resolver: &Resolver<'_>,
        line_number: u32,
    ) -> DecodeResult<Namespace> {
        let prefix_index = resolver.optional_at(body, "namespace prefix")?;
        let uri_index = resolver.optional_at(body, "namespace uri")?;
        Ok(Namespace {
            prefix_index,
            uri_index,
            line_number,
        })
    }

    fn end_namespace(&mut self, offset: usize, namespace: &Namespace) -> DecodeResult<()> {
        let Some((innermost, depth)) = self.scopes.pop() else {
            return Err(AxmlError::unbalanced_namespace(
                offset,
                "namespace end without a matching start",
            ));
        };

        if innermost.prefix_index != namespace.prefix_index
            || innermost.uri_index != namespace.uri_index
        {
            return Err(AxmlError::unbalanced_namespace(
                offset,
                format!(
                    "namespace end (prefix {:?}, uri {:?}) does not match the innermost start (prefix {:?}, uri {:?})",
                    namespace.prefix_index,
                    namespace.uri_index,
                    innermost.prefix_index,
                    innermost.uri_index
                ),
            ));
        }

        if depth != self.stack.len() {
            return Err(AxmlError::unbalanced_namespace(
                offset,
                format!(
                    "namespace opened at element depth {depth} ends at depth {}",
                    self.stack.len()
                ),
            ));
        }

        // A declaration that scoped no element is dropped from the pending list.
        if self.pending.last() == Some(&innermost) {
            self.pending.pop();
        }
        Ok(())
    }

    fn read_start_element(
        body: &mut ByteCursor<'_>,
        resolver: &Resolver<'_>,
        line_number: u32,
        comment_index: Option<u32>,
    ) -> DecodeResult<Element> {
        let attr_ext_start = body.pos();
        let namespace_index = resolver.optional_at(body, "element namespace")?;
        let name_index = resolver.required_at(body, "element name")?;
        let attribute_start = usize::from(body.u16_named("attribute start")?);
        let attribute_size = usize::from(body.u16_named("attribute size")?);
        let attribute_count = usize::from(body.u16_named("attribute count")?);
        let id_index = body.u16_named("id index")?;
        let class_index = body.u16_named("class index")?;
        let style_index = body.u16_named("style index")?;

        let mut attributes = Vec::with_capacity(attribute_count);
        if attribute_count > 0 {
            if attribute_size < ATTRIBUTE_FIXED_SIZE + TYPED_VALUE_SIZE {
                return Err(AxmlError::malformed_chunk(
                    attr_ext_start,
                    format!("attribute size {attribute_size} is too small"),
                ));
            }

            let array_start = attr_ext_start + attribute_start;
            let array_end = attribute_count
                .checked_mul(attribute_size)
                .and_then(|len| array_start.checked_add(len))
                .filter(|&end| end <= body.end())
                .ok_or_else(|| {
                    AxmlError::malformed_chunk(
                        attr_ext_start,
                        format!(
                            "{attribute_count} attributes of {attribute_size} bytes starting at {attribute_start} do not fit in the element"
                        ),
                    )
                })?;

            for i in 0..attribute_count {
                let start = array_start + i * attribute_size;
                let mut attr = body.sub_cursor(start, start + attribute_size, "attribute")?;
                attributes.push(Attribute {
                    namespace_index: resolver.optional_at(&mut attr, "attribute namespace")?,
                    name_index: resolver.required_at(&mut attr, "attribute name")?,
                    raw_value_index: resolver.optional_at(&mut attr, "attribute raw value")?,
                    typed_value: resolver.typed_value(&mut attr)?,
                });
            }
            body.set_pos(array_end, "attribute array end")?;
        }

        Ok(Element {
            namespace_index,
            name_index,
            line_number,
            comment_index,
            id_index,
            class_index,
            style_index,
            namespaces: Vec::new(),
            attributes,
            text: Vec::new(),
            children: Vec::new(),
        })
    }

    fn start_element(&mut self, offset: usize, mut element: Element) -> DecodeResult<()> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(AxmlError::unbalanced_element(
                offset,
                "a second root element was started",
            ));
        }
        if self.stack.len() >= self.settings.get_max_depth() {
            return Err(AxmlError::malformed_chunk(
                offset,
                format!(
                    "element nesting exceeds the maximum depth of {}",
                    self.settings.get_max_depth()
                ),
            ));
        }

        element.namespaces = std::mem::take(&mut self.pending);
        trace!(
            "Start element at {offset}: name {} with {} attribute(s)",
            element.name_index,
            element.attributes.len()
        );
        self.stack.push(element);
        Ok(())
    }

    fn end_element(
        &mut self,
        offset: usize,
        namespace_index: Option<u32>,
        name_index: u32,
    ) -> DecodeResult<()> {
        let Some(element) = self.stack.pop() else {
            return Err(AxmlError::unbalanced_element(
                offset,
                "element end without a matching start",
            ));
        };

        if element.name_index != name_index || element.namespace_index != namespace_index {
            return Err(AxmlError::unbalanced_element(
                offset,
                format!(
                    "element end (name {name_index}, namespace {namespace_index:?}) does not match the innermost start (name {}, namespace {:?})",
                    element.name_index, element.namespace_index
                ),
            ));
        }

        if self
            .scopes
            .last()
            .is_some_and(|(_, depth)| *depth > self.stack.len())
        {
            return Err(AxmlError::unbalanced_element(
                offset,
                format!(
                    "element (name {name_index}) ends while a namespace opened inside it is still in scope"
                ),
            ));
        }

        trace!("End element at {offset}: name {name_index}");
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.root = Some(element),
        }
        Ok(())
    }

    /// Finish the tree once the chunk stream is exhausted at `end`.
    pub(crate) fn finish(self, end: usize) -> DecodeResult<Tree> {
        if !self.stack.is_empty() || !self.scopes.is_empty() {
            return Err(AxmlError::TruncatedDocument {
                offset: end as u64,
                open_elements: self.stack.len(),
                open_namespaces: self.scopes.len(),
            });
        }

        Ok(Tree {
            root: self.root,
            namespaces: self.declared,
        })
    }
}

/// Validates string pool references while reading node fields.
struct Resolver<'p> {
    pool: &'p StringPool,
}

impl Resolver<'_> {
    fn optional(&self, index: u32, pos: usize, what: &'static str) -> DecodeResult<Option<u32>> {
        if index == NO_ENTRY {
            return Ok(None);
        }
        if index as usize >= self.pool.len() {
            return Err(AxmlError::malformed_string(
                pos,
                format!(
                    "{what} references string {index}, but the pool has {} entries",
                    self.pool.len()
                ),
            ));
        }
        Ok(Some(index))
    }

    fn optional_at(&self, cursor: &mut ByteCursor<'_>, what: &'static str) -> DecodeResult<Option<u32>> {
        let pos = cursor.pos();
        let index = cursor.u32_named(what)?;
        self.optional(index, pos, what)
    }

    fn required_at(&self, cursor: &mut ByteCursor<'_>, what: &'static str) -> DecodeResult<u32> {
        let pos = cursor.pos();
        self.optional_at(cursor, what)?.ok_or_else(|| {
            AxmlError::malformed_string(pos, format!("{what} is missing"))
        })
    }

    fn typed_value(&self, cursor: &mut ByteCursor<'_>) -> DecodeResult<TypedValue> {
        let pos = cursor.pos();
        let value = TypedValue::read(cursor)?;
        if value.data_type == DataType::String {
            self.optional(value.data, pos + 4, "string typed value")?;
        }
        Ok(value)
    }
}
