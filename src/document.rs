use crate::model::{Attribute, Element, Namespace};
use crate::resource_map::ResourceMap;
use crate::string_pool::StringPool;
use crate::value::ResourceValue;
use crate::visitor::{self, Elements, Visitor};

use serde::Serialize;

/// URI bound to the `android` prefix in manifests and layouts.
pub const ANDROID_NAMESPACE_URI: &str = "http://schemas.android.com/apk/res/android";

/// A fully decoded binary XML document.
///
/// The document owns copies of every decoded string, so the input buffer may be dropped as
/// soon as decoding returns. It is immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestDocument {
    pub(crate) magic_number: u32,
    pub(crate) file_size: u32,
    pub(crate) string_pool: StringPool,
    pub(crate) resource_map: Option<ResourceMap>,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) root: Option<Element>,
}

impl ManifestDocument {
    pub fn magic_number(&self) -> u32 {
        self.magic_number
    }

    /// The size declared by the file header, which may be smaller than the decoded buffer.
    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn string_pool(&self) -> &StringPool {
        &self.string_pool
    }

    pub fn resource_map(&self) -> Option<&ResourceMap> {
        self.resource_map.as_ref()
    }

    /// Every namespace declaration, in document order.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// `None` for a document without elements.
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    pub fn string_at(&self, index: u32) -> Option<&str> {
        self.string_pool.get(index)
    }

    pub fn resource_id_at(&self, index: u32) -> Option<u32> {
        self.resource_map.as_ref().and_then(|map| map.get(index))
    }

    pub fn element_name(&self, element: &Element) -> Option<&str> {
        self.string_at(element.name_index)
    }

    pub fn element_namespace_uri(&self, element: &Element) -> Option<&str> {
        element.namespace_index.and_then(|ns| self.string_at(ns))
    }

    pub fn attribute_name(&self, attribute: &Attribute) -> Option<&str> {
        self.string_at(attribute.name_index)
    }

    pub fn namespace_uri(&self, attribute: &Attribute) -> Option<&str> {
        attribute.namespace_index.and_then(|ns| self.string_at(ns))
    }

    /// Prefix bound to `uri` by a declaration anywhere in the document.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|ns| ns.uri_index.and_then(|i| self.string_at(i)) == Some(uri))
            .and_then(|ns| ns.prefix_index)
            .and_then(|i| self.string_at(i))
    }

    /// Android resource id of the attribute name, e.g. `0x0101021b` for `versionCode`.
    pub fn attribute_resource_id(&self, attribute: &Attribute) -> Option<u32> {
        self.resource_id_at(attribute.name_index)
    }

    /// The attribute value. String and null values use the raw string when present; every
    /// other type is interpreted from the typed value alone.
    pub fn attribute_value(&self, attribute: &Attribute) -> ResourceValue {
        let raw = attribute.raw_value_index.and_then(|i| self.string_at(i));
        attribute.typed_value.resolve(raw, &self.string_pool)
    }

    /// Concatenated character data directly inside `element`.
    pub fn element_text(&self, element: &Element) -> String {
        element
            .text
            .iter()
            .filter_map(|cdata| cdata.data_index.and_then(|i| self.string_at(i)))
            .collect()
    }

    /// Value of `android:<name>` on `element`.
    pub fn android_attribute(&self, element: &Element, name: &str) -> Option<ResourceValue> {
        element
            .attribute_ns(self, ANDROID_NAMESPACE_URI, name)
            .map(|attr| self.attribute_value(attr))
    }

    /// The `package` attribute of the root element.
    pub fn package_name(&self) -> Option<&str> {
        let root = self.root()?;
        let attr = root
            .attributes
            .iter()
            .find(|attr| attr.namespace_index.is_none() && self.attribute_name(attr) == Some("package"))?;
        attr.raw_value_index.and_then(|i| self.string_at(i))
    }

    pub fn walk<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor::walk(self, visitor)
    }

    /// Every element in pre-order, starting with the root.
    pub fn elements(&self) -> Elements<'_> {
        Elements::new(self.root())
    }
}
