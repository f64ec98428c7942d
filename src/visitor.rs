//! Visitor utilities for the decoded element tree.
//!
//! Traversal behavior:
//! - `walk` calls `visit_start_element` before visiting anything inside the element and
//!   `visit_end_element` after all children are processed.
//! - Character data of an element is visited right after `visit_start_element`, before its children.
//! - Attributes and namespace declarations are left to the visitor; they are accessible through
//!   the `Element` passed to `visit_start_element`.

use crate::document::ManifestDocument;
use crate::model::{CData, Element};

/// Visitor interface for traversing a decoded document.
pub trait Visitor {
    /// Error type returned by visitor callbacks.
    type Error;

    /// Called when entering an element (pre-order).
    fn visit_start_element(&mut self, doc: &ManifestDocument, element: &Element) -> Result<(), Self::Error>;

    /// Called when leaving an element (post-order).
    fn visit_end_element(&mut self, doc: &ManifestDocument, element: &Element) -> Result<(), Self::Error>;

    fn visit_cdata(&mut self, _doc: &ManifestDocument, _cdata: &CData) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Depth-first walk starting at the document root. Does nothing for an empty document.
pub fn walk<V: Visitor>(doc: &ManifestDocument, visitor: &mut V) -> Result<(), V::Error> {
    match doc.root() {
        Some(root) => walk_element(doc, root, visitor),
        None => Ok(()),
    }
}

fn walk_element<V: Visitor>(
    doc: &ManifestDocument,
    element: &Element,
    visitor: &mut V,
) -> Result<(), V::Error> {
    visitor.visit_start_element(doc, element)?;
    for cdata in &element.text {
        visitor.visit_cdata(doc, cdata)?;
    }
    for child in &element.children {
        walk_element(doc, child, visitor)?;
    }
    visitor.visit_end_element(doc, element)
}

/// Pre-order iterator over every element of a document.
pub struct Elements<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Elements<'a> {
    pub(crate) fn new(root: Option<&'a Element>) -> Self {
        Elements {
            stack: root.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
