//! pom.xml parser building a whitespace-preserving [`Document`].
//!
//! Uses the quick-xml pull reader with text trimming disabled, so every
//! indentation and line break between elements survives as a text node and
//! can be written back unchanged.

use crate::dom::{Attribute, Document, ElementData, NodeId, NodeKind};
use crate::error::{PomError, Result};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

struct LineOffsetTable {
    line_starts: Vec<usize>,
}

impl LineOffsetTable {
    fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in content.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line and column of a byte offset.
    fn line_column(&self, content: &str, offset: usize) -> (usize, usize) {
        let mut offset = offset.min(content.len());
        while !content.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = content[self.line_starts[line]..offset].chars().count();
        (line + 1, column + 1)
    }
}

struct TreeBuilder<'a> {
    content: &'a str,
    line_table: LineOffsetTable,
    document: Document,
    open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(content: &'a str) -> Self {
        let document = Document::new();
        let open = vec![document.root()];
        Self {
            content,
            line_table: LineOffsetTable::new(content),
            document,
            open,
        }
    }

    fn error(&self, offset: u64, message: impl std::fmt::Display) -> PomError {
        let (line, column) = self.line_table.line_column(self.content, offset as usize);
        PomError::ParseError {
            message: format!("line {line}, column {column}: {message}"),
        }
    }

    fn current(&self) -> NodeId {
        self.open[self.open.len() - 1]
    }

    fn at_top_level(&self) -> bool {
        self.open.len() == 1
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let parent = self.current();
        self.document.push_child(parent, kind)
    }

    /// Appends text to the current element, merging with a directly
    /// preceding text node (quick-xml reports entity references separately).
    /// `source` is the escaped form as written in the file.
    fn push_text(&mut self, offset: u64, text: &str, source: &str) -> Result<()> {
        if self.at_top_level() && !text.trim().is_empty() {
            return Err(self.error(offset, "text outside of the document element"));
        }
        let parent = self.current();
        self.document.push_parsed_text(parent, text, source);
        Ok(())
    }

    fn start_element(&mut self, offset: u64, start: &BytesStart<'_>, empty_tag: bool) -> Result<()> {
        if self.at_top_level() && self.document.document_element().is_some() {
            return Err(self.error(offset, "more than one document element"));
        }
        let data = element_data(start, empty_tag).map_err(|e| self.error(offset, e))?;
        let element = self.push(NodeKind::Element(data));
        if !empty_tag {
            self.open.push(element);
        }
        Ok(())
    }

    fn end_element(&mut self, offset: u64, name: &str) -> Result<()> {
        if self.at_top_level() {
            return Err(self.error(offset, format!("unexpected end tag </{name}>")));
        }
        let element = self.current();
        let expected = self.document.name(element).unwrap_or_default();
        if expected != name {
            return Err(self.error(
                offset,
                format!("expected </{expected}>, found </{name}>"),
            ));
        }
        self.open.pop();
        Ok(())
    }

    fn finish(self) -> Result<Document> {
        if !self.at_top_level() {
            let name = self
                .document
                .name(self.current())
                .unwrap_or_default()
                .to_string();
            return Err(self.error(
                self.content.len() as u64,
                format!("unclosed element <{name}>"),
            ));
        }
        if self.document.document_element().is_none() {
            return Err(self.error(0, "missing document element"));
        }
        Ok(self.document)
    }
}

fn element_data(start: &BytesStart<'_>, empty_tag: bool) -> Result<ElementData> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let raw_attributes = String::from_utf8_lossy(start.attributes_raw()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| PomError::ParseError {
            message: e.to_string(),
        })?;
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        let value = unescape(&raw).map(|c| c.into_owned()).unwrap_or(raw);
        attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value,
        });
    }

    Ok(ElementData {
        name,
        attributes,
        raw_attributes,
        empty_tag,
    })
}

/// Parses XML text into a [`Document`].
///
/// # Errors
///
/// Returns `PomError::ParseError` with a 1-based line and column for
/// malformed markup, mismatched or unclosed tags, unknown entity references
/// and documents without a document element.
pub fn parse_document(content: &str) -> Result<Document> {
    let (content, byte_order_mark) = match content.strip_prefix('\u{FEFF}') {
        Some(rest) => (rest, true),
        None => (content, false),
    };
    let mut builder = TreeBuilder::new(content);
    builder.document.set_byte_order_mark(byte_order_mark);
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    loop {
        let pos = reader.buffer_position();
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(builder.error(reader.buffer_position(), e)),
        };

        match event {
            Event::Start(ref e) => builder.start_element(pos, e, false)?,
            Event::Empty(ref e) => builder.start_element(pos, e, true)?,
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                builder.end_element(pos, &name)?;
            }
            Event::Text(ref e) => {
                let raw = e.decode().map_err(|err| builder.error(pos, err))?;
                let text = unescape(&raw).map_err(|err| builder.error(pos, err))?;
                builder.push_text(pos, &text, &raw)?;
            }
            Event::GeneralRef(ref e) => {
                let name = e.decode().map_err(|err| builder.error(pos, err))?;
                let reference = format!("&{name};");
                let text = unescape(&reference).map_err(|_| {
                    builder.error(pos, format!("unknown entity reference {reference}"))
                })?;
                builder.push_text(pos, &text, &reference)?;
            }
            Event::CData(ref e) => {
                builder.push(NodeKind::CData(String::from_utf8_lossy(e).into_owned()));
            }
            Event::Comment(ref e) => {
                builder.push(NodeKind::Comment(String::from_utf8_lossy(e).into_owned()));
            }
            Event::Decl(ref e) => {
                builder.push(NodeKind::Declaration(
                    String::from_utf8_lossy(e).into_owned(),
                ));
            }
            Event::PI(ref e) => {
                builder.push(NodeKind::ProcessingInstruction(
                    String::from_utf8_lossy(e).into_owned(),
                ));
            }
            Event::DocType(ref e) => {
                builder.push(NodeKind::DocType(String::from_utf8_lossy(e).into_owned()));
            }
            Event::Eof => break,
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    builder.finish()
}
