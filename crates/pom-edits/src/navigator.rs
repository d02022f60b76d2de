//! Lookup and creation of named child elements.

use crate::editor::PomEditor;
use pom_core::{NodeId, NodeKind, PomError, Result};

impl PomEditor<'_> {
    /// First direct child element of `parent` named `name`.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let document = self.document();
        document
            .children(parent)
            .find(|&c| document.name(c) == Some(name))
    }

    /// All direct child elements of `parent` named `name`, in document order.
    pub fn find_children(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        let document = self.document();
        document
            .children(parent)
            .filter(|&c| document.name(c) == Some(name))
            .collect()
    }

    /// Trimmed text content of an element, concatenating its direct text and
    /// CDATA children. `None` if `element` is not an element.
    pub fn text_value(&self, element: NodeId) -> Option<String> {
        let document = self.document();
        if !document.is_element(element) {
            return None;
        }
        let mut value = String::new();
        for child in document.children(element) {
            match document.kind(child) {
                Some(NodeKind::Text(text) | NodeKind::CData(text)) => value.push_str(text),
                _ => {}
            }
        }
        Some(value.trim().to_string())
    }

    /// Replaces every child of `element` with a single text node.
    pub fn set_text(&mut self, element: NodeId, value: &str) -> Result<()> {
        let document = self.document_mut();
        if !document.is_element(element) {
            return Err(PomError::InvalidArgument(
                "text can only be set on an element".into(),
            ));
        }
        let children: Vec<NodeId> = document.children(element).collect();
        for child in children {
            document.remove_child(element, child)?;
        }
        let text = document.create_text(value);
        document.append_child(element, text)
    }

    /// Walks `names` below `parent`, creating every missing element as the
    /// last child of its parent, and returns the final element.
    ///
    /// Only the first element created along the chain is formatted, once the
    /// whole chain exists.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `names` is empty.
    pub fn get_child(&mut self, parent: NodeId, names: &[&str]) -> Result<NodeId> {
        if names.is_empty() {
            return Err(PomError::InvalidArgument(
                "At least one child name has to be specified".into(),
            ));
        }

        let mut to_format = None;
        let mut current = parent;
        for name in names {
            current = match self.find_child(current, name) {
                Some(existing) => existing,
                None => {
                    let document = self.document_mut();
                    let created = document.create_element(name)?;
                    document.append_child(current, created)?;
                    to_format.get_or_insert(created);
                    created
                }
            };
        }

        if let Some(node) = to_format {
            self.format(node)?;
        }
        Ok(current)
    }
}
