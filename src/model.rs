//! The decoded node tree.
//!
//! Nodes never own text: names, namespace URIs and raw values are indices into the document's
//! [`StringPool`](crate::StringPool), resolved on demand through the accessors on
//! [`ManifestDocument`].

use crate::document::ManifestDocument;
use crate::value::TypedValue;

use serde::Serialize;

/// A namespace declaration (`xmlns:prefix="uri"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Namespace {
    pub prefix_index: Option<u32>,
    pub uri_index: Option<u32>,
    pub line_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attribute {
    pub namespace_index: Option<u32>,
    pub name_index: u32,
    pub raw_value_index: Option<u32>,
    pub typed_value: TypedValue,
}

/// Character data found between element tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CData {
    pub data_index: Option<u32>,
    pub typed_value: TypedValue,
    pub line_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub namespace_index: Option<u32>,
    pub name_index: u32,
    pub line_number: u32,
    pub comment_index: Option<u32>,
    /// 1-based position of the `id` attribute, 0 if there is none.
    pub id_index: u16,
    /// 1-based position of the `class` attribute, 0 if there is none.
    pub class_index: u16,
    /// 1-based position of the `style` attribute, 0 if there is none.
    pub style_index: u16,
    /// Namespaces whose scope opens at this element.
    pub namespaces: Vec<Namespace>,
    pub attributes: Vec<Attribute>,
    pub text: Vec<CData>,
    pub children: Vec<Element>,
}

impl Element {
    /// First direct child whose local name is `name`.
    pub fn find_child<'a>(&'a self, doc: &ManifestDocument, name: &str) -> Option<&'a Element> {
        self.children
            .iter()
            .find(|child| doc.string_at(child.name_index) == Some(name))
    }

    /// All direct children whose local name is `name`.
    pub fn children_named<'a>(
        &'a self,
        doc: &'a ManifestDocument,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |child| doc.string_at(child.name_index) == Some(name))
    }

    /// First attribute whose local name is `name`, in any namespace.
    pub fn attribute<'a>(&'a self, doc: &ManifestDocument, name: &str) -> Option<&'a Attribute> {
        self.attributes
            .iter()
            .find(|attr| doc.string_at(attr.name_index) == Some(name))
    }

    /// Attribute `name` in the namespace identified by `uri`.
    pub fn attribute_ns<'a>(
        &'a self,
        doc: &ManifestDocument,
        uri: &str,
        name: &str,
    ) -> Option<&'a Attribute> {
        self.attributes.iter().find(|attr| {
            doc.string_at(attr.name_index) == Some(name)
                && attr.namespace_index.and_then(|ns| doc.string_at(ns)) == Some(uri)
        })
    }

    fn attribute_at(&self, one_based: u16) -> Option<&Attribute> {
        match one_based {
            0 => None,
            n => self.attributes.get(usize::from(n) - 1),
        }
    }

    pub fn id_attribute(&self) -> Option<&Attribute> {
        self.attribute_at(self.id_index)
    }

    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.attribute_at(self.class_index)
    }

    pub fn style_attribute(&self) -> Option<&Attribute> {
        self.attribute_at(self.style_index)
    }
}
