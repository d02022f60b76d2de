//! Editing context handed to operations.

use pom_core::{Document, Formatter, NodeId, PomError, Result};

/// A mutable [`Document`] paired with the [`Formatter`] used for the nodes
/// created through it.
///
/// The navigation, building and mutation helpers are implemented as methods
/// on this type in the sibling modules.
pub struct PomEditor<'a> {
    document: &'a mut Document,
    formatter: &'a dyn Formatter,
}

impl std::fmt::Debug for PomEditor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PomEditor")
            .field("document", &self.document.id())
            .finish_non_exhaustive()
    }
}

impl<'a> PomEditor<'a> {
    pub fn new(document: &'a mut Document, formatter: &'a dyn Formatter) -> Self {
        Self {
            document,
            formatter,
        }
    }

    pub fn document(&self) -> &Document {
        &*self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.document
    }

    /// The document element, usually `<project>`.
    pub fn root(&self) -> Result<NodeId> {
        self.document
            .document_element()
            .ok_or_else(|| PomError::InvalidArgument("document has no root element".into()))
    }

    /// Formats a node created by the caller.
    ///
    /// If the node is the last child of its parent, a line break in the
    /// document's line delimiter is appended after it first so the formatter
    /// sees a terminated line.
    pub fn format(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.document.parent(node)
            && self.document.last_child(parent) == Some(node)
        {
            let delimiter = self.document.line_delimiter();
            let newline = self.document.create_text(delimiter);
            self.document.append_child(parent, newline)?;
        }
        self.formatter.format_node(&mut *self.document, node)
    }
}
