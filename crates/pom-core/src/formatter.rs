//! Whitespace formatting of freshly inserted subtrees.

use crate::config::FormatConfig;
use crate::dom::{Document, NodeId, NodeKind};
use crate::error::Result;

/// Re-indents a subtree so it matches the surrounding document.
///
/// Implementations must only touch `node`, its descendants and the
/// whitespace directly around it.
pub trait Formatter: Send + Sync {
    fn format_node(&self, document: &mut Document, node: NodeId) -> Result<()>;
}

/// Leaves the document untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format_node(&self, _document: &mut Document, _node: NodeId) -> Result<()> {
        Ok(())
    }
}

/// Line-per-element XML formatter.
///
/// The node is indented one unit deeper than its parent's line, every
/// element or comment below it gets its own line, and containers are closed
/// on a line indented like their start tag. Whitespace-only text nodes are
/// rewritten in place, keeping any blank lines they already contain;
/// text with real content is never modified.
#[derive(Debug, Clone, Default)]
pub struct XmlFormatter {
    config: FormatConfig,
}

impl XmlFormatter {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    fn indent_unit(&self, document: &Document) -> String {
        if self.config.detect_indentation
            && let Some(unit) = detect_indent_unit(document)
        {
            return unit;
        }
        self.config.indent_unit()
    }

    /// Indentation of the line on which `element` starts.
    fn line_indent(&self, document: &Document, element: NodeId, unit: &str) -> String {
        let Some(parent) = document.parent(element) else {
            return String::new();
        };
        if !document.is_element(parent) {
            return String::new();
        }
        if let Some(prev) = document.previous_sibling(element)
            && let Some(indent) = document.text(prev).and_then(trailing_indent)
        {
            return indent.to_string();
        }
        let mut indent = self.line_indent(document, parent, unit);
        indent.push_str(unit);
        indent
    }

    fn format_children(
        &self,
        document: &mut Document,
        element: NodeId,
        indent: &str,
        unit: &str,
        newline: &str,
    ) -> Result<()> {
        let children: Vec<NodeId> = document.children(element).collect();
        let mixed = children
            .iter()
            .any(|&c| document.text(c).is_some_and(|t| !t.trim().is_empty()));
        if mixed || !children.iter().any(|&c| is_block(document, c)) {
            return Ok(());
        }

        let child_indent = format!("{indent}{unit}");
        for child in children {
            if !is_block(document, child) {
                continue;
            }
            indent_before(document, element, child, &child_indent, newline)?;
            if document.is_element(child) {
                self.format_children(document, child, &child_indent, unit, newline)?;
            }
        }

        match document.last_child(element) {
            Some(last) if is_whitespace_text(document, last) => {
                reindent(document, last, indent, newline)
            }
            Some(last) if document.is_text(last) => Ok(()),
            _ => {
                let closing = document.create_text(&format!("{newline}{indent}"));
                document.append_child(element, closing)
            }
        }
    }
}

impl Formatter for XmlFormatter {
    fn format_node(&self, document: &mut Document, node: NodeId) -> Result<()> {
        if !document.is_element(node) {
            return Ok(());
        }
        let unit = self.indent_unit(document);
        let newline = document.line_delimiter();

        let parent = match document.parent(node) {
            Some(parent) if document.is_element(parent) => parent,
            _ => return self.format_children(document, node, "", &unit, newline),
        };

        let parent_indent = self.line_indent(document, parent, &unit);
        let indent = format!("{parent_indent}{unit}");
        indent_before(document, parent, node, &indent, newline)?;
        indent_after(document, parent, node, &indent, &parent_indent, newline)?;
        self.format_children(document, node, &indent, &unit, newline)
    }
}

/// Indentation of the first indented child of the document element.
fn detect_indent_unit(document: &Document) -> Option<String> {
    let root = document.document_element()?;
    document
        .children(root)
        .filter(|&c| document.is_element(c))
        .find_map(|c| {
            let prev = document.previous_sibling(c)?;
            let indent = trailing_indent(document.text(prev)?)?;
            (!indent.is_empty()).then(|| indent.to_string())
        })
}

/// Whitespace following the last line break of `text`.
fn trailing_indent(text: &str) -> Option<&str> {
    let newline = text.rfind('\n')?;
    let tail = &text[newline + 1..];
    tail.chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(tail)
}

fn is_whitespace_text(document: &Document, node: NodeId) -> bool {
    document.text(node).is_some_and(|t| t.trim().is_empty())
}

fn is_block(document: &Document, node: NodeId) -> bool {
    matches!(
        document.kind(node),
        Some(NodeKind::Element(_) | NodeKind::Comment(_))
    )
}

/// Replaces everything after the last line break of a whitespace text node
/// with `indent`, adding a line break if there is none.
fn reindent(document: &mut Document, node: NodeId, indent: &str, newline: &str) -> Result<()> {
    let text = document.text(node).unwrap_or_default();
    let updated = match text.rfind('\n') {
        Some(pos) => format!("{}{indent}", &text[..=pos]),
        None => format!("{newline}{indent}"),
    };
    document.set_text(node, &updated)
}

fn indent_before(
    document: &mut Document,
    parent: NodeId,
    node: NodeId,
    indent: &str,
    newline: &str,
) -> Result<()> {
    match document.previous_sibling(node) {
        Some(prev) if is_whitespace_text(document, prev) => {
            reindent(document, prev, indent, newline)
        }
        Some(prev) if document.is_text(prev) => Ok(()),
        _ => {
            let ws = document.create_text(&format!("{newline}{indent}"));
            document.insert_before(parent, ws, node)
        }
    }
}

fn indent_after(
    document: &mut Document,
    parent: NodeId,
    node: NodeId,
    indent: &str,
    parent_indent: &str,
    newline: &str,
) -> Result<()> {
    match document.next_sibling(node) {
        Some(next) if is_whitespace_text(document, next) => {
            if document.next_sibling(next).is_none() {
                reindent(document, next, parent_indent, newline)
            } else {
                reindent(document, next, indent, newline)
            }
        }
        Some(next) if document.is_text(next) => Ok(()),
        Some(_) => {
            let ws = document.create_text(&format!("{newline}{indent}"));
            document.insert_after(parent, ws, node)
        }
        None => {
            let ws = document.create_text(&format!("{newline}{parent_indent}"));
            document.append_child(parent, ws)
        }
    }
}
