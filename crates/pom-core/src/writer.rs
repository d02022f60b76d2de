//! Serializes a [`Document`] back to XML text.
//!
//! Parsed markup is written exactly as it was read (raw attribute text,
//! character references, comments, declarations). Only text created or
//! changed after parsing goes through escaping.

use crate::dom::{Document, NodeId, NodeKind};
use quick_xml::escape::partial_escape;

pub fn write_document(document: &Document) -> String {
    let mut out = String::new();
    if document.has_byte_order_mark() {
        out.push('\u{FEFF}');
    }
    for child in document.children(document.root()) {
        write_node(document, child, &mut out);
    }
    out
}

/// Serializes a single node and its subtree.
pub fn write_node(document: &Document, node: NodeId, out: &mut String) {
    let Some(kind) = document.kind(node) else {
        return;
    };
    match kind {
        NodeKind::Document => {
            for child in document.children(node) {
                write_node(document, child, out);
            }
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            out.push_str(&element.raw_attributes);
            if document.first_child(node).is_none() && element.empty_tag {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in document.children(node) {
                write_node(document, child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
        NodeKind::Text(text) => match document.source_text(node) {
            Some(source) => out.push_str(source),
            None => out.push_str(&partial_escape(text.as_str())),
        },
        NodeKind::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        NodeKind::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction(content) | NodeKind::Declaration(content) => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
        NodeKind::DocType(content) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(content.trim_start());
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_created_elements() {
        let mut doc = Document::new();
        let project = doc.create_element("project").unwrap();
        doc.append_child(doc.root(), project).unwrap();
        let empty = doc.create_element("dependencies").unwrap();
        doc.append_child(project, empty).unwrap();
        let name = doc.create_element("name").unwrap();
        doc.append_child(project, name).unwrap();
        let text = doc.create_text("a < b & c \"quoted\"");
        doc.append_child(name, text).unwrap();

        assert_eq!(
            write_document(&doc),
            "<project><dependencies/><name>a &lt; b &amp; c \"quoted\"</name></project>"
        );
    }

    #[test]
    fn test_parsed_empty_tag_expands_once_filled() {
        let mut doc = Document::parse("<project><dependencies/></project>").unwrap();
        let project = doc.document_element().unwrap();
        let deps = doc.first_child(project).unwrap();
        let dep = doc.create_element("dependency").unwrap();
        doc.append_child(deps, dep).unwrap();

        assert_eq!(
            write_document(&doc),
            "<project><dependencies><dependency/></dependencies></project>"
        );
    }

    #[test]
    fn test_write_single_node() {
        let doc = Document::parse("<project><a x=\"1\">v</a><!--c--></project>").unwrap();
        let project = doc.document_element().unwrap();
        let a = doc.first_child(project).unwrap();

        let mut out = String::new();
        write_node(&doc, a, &mut out);
        assert_eq!(out, "<a x=\"1\">v</a>");
    }

    #[test]
    fn test_changed_text_is_escaped() {
        let mut doc = Document::parse("<project><name>&#65;</name></project>").unwrap();
        let project = doc.document_element().unwrap();
        let name = doc.first_child(project).unwrap();
        let text = doc.first_child(name).unwrap();
        assert_eq!(write_document(&doc), "<project><name>&#65;</name></project>");

        doc.set_text(text, "<B>").unwrap();
        assert_eq!(write_document(&doc), "<project><name>&lt;B&gt;</name></project>");
    }

    #[test]
    fn test_write_doctype_and_pi() {
        let xml = "<?xml version=\"1.0\"?>\n<?m2e ignore?>\n<!DOCTYPE project>\n<project/>";
        let doc = Document::parse(xml).unwrap();
        assert_eq!(write_document(&doc), xml);
    }
}
