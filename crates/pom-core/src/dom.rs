//! In-memory XML tree for a single pom.xml.
//!
//! All nodes of a [`Document`] live in one arena and are addressed by
//! [`NodeId`] handles. A handle remembers which document created it and is
//! rejected by any other document. Removed nodes stay in the arena as
//! detached nodes.

use crate::error::{PomError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    document: u64,
    index: usize,
}

/// Element name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Attribute section exactly as it appeared in the source, including
    /// leading whitespace and line breaks.
    pub raw_attributes: String,
    /// Serialize as `<name/>` while the element has no children.
    pub empty_tag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Unescaped attribute value.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Escaped text exactly as it appeared in the source. Written back
    /// verbatim until the text is changed.
    source: Option<String>,
}

/// An XML document tree.
///
/// Cloning a document keeps its identity: node handles taken from the
/// original remain valid for the clone, which is what undo snapshots rely on.
#[derive(Debug, Clone)]
pub struct Document {
    id: u64,
    nodes: Vec<NodeData>,
    stamp: u64,
    byte_order_mark: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                source: None,
            }],
            stamp: next_stamp(),
            byte_order_mark: false,
        }
    }

    /// Parses XML text into a document.
    pub fn parse(content: &str) -> Result<Self> {
        crate::parser::parse_document(content)
    }

    /// Serializes the document back to XML text.
    pub fn to_xml(&self) -> String {
        crate::writer::write_document(self)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Modification stamp, changed by every structural or text mutation.
    ///
    /// Stamps come from a process-wide counter, so two different states of a
    /// document never share a stamp.
    pub fn modification_stamp(&self) -> u64 {
        self.stamp
    }

    /// Whether the source started with a UTF-8 byte order mark. It is
    /// written back on serialization.
    pub fn has_byte_order_mark(&self) -> bool {
        self.byte_order_mark
    }

    pub(crate) fn set_byte_order_mark(&mut self, present: bool) {
        self.byte_order_mark = present;
    }

    /// Line delimiter used by the document: `"\r\n"` if the first line break
    /// found in its text is CRLF, `"\n"` otherwise.
    pub fn line_delimiter(&self) -> &'static str {
        let first_break = self.nodes.iter().find_map(|data| match &data.kind {
            NodeKind::Text(text) => text.find('\n').map(|pos| &text[..pos]),
            _ => None,
        });
        match first_break {
            Some(before) if before.ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    /// The document node (parent of the document element).
    pub fn root(&self) -> NodeId {
        self.handle(0)
    }

    /// The top-level element, e.g. `<project>`.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root()).find(|&c| self.is_element(c))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.document == self.id && node.index < self.nodes.len()
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.data(node).ok().map(|d| &d.kind)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Element(_)))
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Text(_)))
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.kind(node)? {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Element name, or `None` if `node` is not an element.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.name.as_str())
    }

    /// Content of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.data(node).ok()?.parent?;
        Some(self.handle(parent))
    }

    /// Children of `node` in document order. Empty for foreign handles.
    pub fn children(&self, node: NodeId) -> impl DoubleEndedIterator<Item = NodeId> {
        let indices: &[usize] = match self.data(node) {
            Ok(data) => &data.children,
            Err(_) => &[],
        };
        let document = self.id;
        indices
            .iter()
            .map(move |&index| NodeId { document, index })
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).next()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).next_back()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (siblings, position) = self.position_in_parent(node)?;
        let index = *siblings.get(position.checked_sub(1)?)?;
        Some(self.handle(index))
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (siblings, position) = self.position_in_parent(node)?;
        let index = *siblings.get(position + 1)?;
        Some(self.handle(index))
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: &str) -> Result<NodeId> {
        validate_name(name)?;
        Ok(self.push(NodeKind::Element(ElementData {
            name: name.to_string(),
            attributes: Vec::new(),
            raw_attributes: String::new(),
            empty_tag: true,
        })))
    }

    /// Creates a detached text node. The text is stored verbatim and escaped
    /// on serialization.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Appends a detached `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        self.nodes[parent.index].children.push(child.index);
        self.nodes[child.index].parent = Some(parent.index);
        self.touch();
        Ok(())
    }

    /// Inserts a detached `child` into `parent` right before `reference`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        let position = self.child_position(parent, reference)?;
        self.nodes[parent.index]
            .children
            .insert(position, child.index);
        self.nodes[child.index].parent = Some(parent.index);
        self.touch();
        Ok(())
    }

    /// Inserts a detached `child` into `parent` right after `reference`.
    pub fn insert_after(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        let position = self.child_position(parent, reference)?;
        self.nodes[parent.index]
            .children
            .insert(position + 1, child.index);
        self.nodes[child.index].parent = Some(parent.index);
        self.touch();
        Ok(())
    }

    /// Detaches `child` from `parent`. The node and its subtree stay valid
    /// and may be attached again.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_owned(child)?;
        let position = self.child_position(parent, child)?;
        self.nodes[parent.index].children.remove(position);
        self.nodes[child.index].parent = None;
        self.touch();
        Ok(())
    }

    /// Replaces the content of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.check_owned(node)?;
        match &mut self.nodes[node.index].kind {
            NodeKind::Text(current) => {
                if current != text {
                    text.clone_into(current);
                    self.nodes[node.index].source = None;
                    self.touch();
                }
                Ok(())
            }
            _ => Err(PomError::invalid_argument("node is not a text node")),
        }
    }

    fn handle(&self, index: usize) -> NodeId {
        NodeId {
            document: self.id,
            index,
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            source: None,
        });
        self.touch();
        self.handle(self.nodes.len() - 1)
    }

    pub(crate) fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let child = self.push(kind);
        self.nodes[parent.index].children.push(child.index);
        self.nodes[child.index].parent = Some(parent.index);
        child
    }

    /// Appends parsed text to `parent`, merging it into a directly
    /// preceding parsed text node.
    pub(crate) fn push_parsed_text(&mut self, parent: NodeId, text: &str, source: &str) {
        let last = self.nodes[parent.index].children.last().copied();
        if let Some(last) = last
            && let NodeData {
                kind: NodeKind::Text(existing),
                source: Some(existing_source),
                ..
            } = &mut self.nodes[last]
        {
            existing.push_str(text);
            existing_source.push_str(source);
            return;
        }
        let child = self.push_child(parent, NodeKind::Text(text.to_string()));
        self.nodes[child.index].source = Some(source.to_string());
    }

    /// Source form of a parsed text node that has not been changed since.
    pub(crate) fn source_text(&self, node: NodeId) -> Option<&str> {
        self.data(node).ok()?.source.as_deref()
    }

    fn touch(&mut self) {
        self.stamp = next_stamp();
    }

    fn data(&self, node: NodeId) -> Result<&NodeData> {
        self.check_owned(node)?;
        Ok(&self.nodes[node.index])
    }

    fn check_owned(&self, node: NodeId) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(PomError::invalid_argument(format!(
                "node {:?} does not belong to document {}",
                node, self.id
            )))
        }
    }

    fn position_in_parent(&self, node: NodeId) -> Option<(&[usize], usize)> {
        let parent = self.data(node).ok()?.parent?;
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&i| i == node.index)?;
        Some((siblings, position))
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.check_owned(parent)?;
        self.nodes[parent.index]
            .children
            .iter()
            .position(|&i| i == child.index && child.document == self.id)
            .ok_or_else(|| PomError::invalid_argument("reference node is not a child of parent"))
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_owned(parent)?;
        self.check_owned(child)?;
        if !matches!(
            self.nodes[parent.index].kind,
            NodeKind::Element(_) | NodeKind::Document
        ) {
            return Err(PomError::invalid_argument(
                "only elements and the document node can have children",
            ));
        }
        if child.index == 0 {
            return Err(PomError::invalid_argument("the document node cannot be attached"));
        }
        if self.nodes[child.index].parent.is_some() {
            return Err(PomError::invalid_argument("node is already attached"));
        }
        let mut ancestor = Some(parent.index);
        while let Some(index) = ancestor {
            if index == child.index {
                return Err(PomError::invalid_argument(
                    "cannot attach a node below itself",
                ));
            }
            ancestor = self.nodes[index].parent;
        }
        Ok(())
    }
}

/// Checks that `name` is usable as an XML element name.
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == ':');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'));
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(PomError::invalid_argument(format!(
            "'{name}' is not a valid element name"
        )))
    }
}
