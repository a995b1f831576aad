use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;

use crate::foundation::error::{XflError, XflResult};

/// An element with its attributes copied out of the reader buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag name.
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    /// Attribute value, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, or `default` when absent.
    pub fn attr_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.attr(key).unwrap_or(default)
    }

    /// Attribute parsed as `f64`, or `default` when absent or malformed.
    pub fn attr_f64(&self, key: &str, default: f64) -> f64 {
        self.attr(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Attribute parsed as `u32`, or `default` when absent or malformed.
    pub fn attr_u32(&self, key: &str, default: u32) -> u32 {
        self.attr(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// One step of the XML stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// `<name ...>`: children follow until the matching [`Node::Close`].
    Open(Element),
    /// `<name .../>`: no children.
    Leaf(Element),
    /// `</name>`.
    Close(String),
}

/// Forward-only cursor over the elements of one XML file.
pub struct XmlStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    origin: PathBuf,
}

impl XmlStream<BufReader<File>> {
    /// Open `path` for streaming.
    pub fn open(path: &Path) -> XflResult<Self> {
        let reader = Reader::from_file(path)
            .map_err(|e| XflError::parse(format!("{}: {e}", path.display())))?;
        Ok(Self::with_reader(reader, path.to_path_buf()))
    }
}

impl<'a> XmlStream<&'a [u8]> {
    /// Stream an in-memory document; `origin` is used in error messages.
    pub fn from_str(text: &'a str, origin: impl Into<PathBuf>) -> Self {
        Self::with_reader(Reader::from_reader(text.as_bytes()), origin.into())
    }
}

impl<R: BufRead> XmlStream<R> {
    fn with_reader(mut reader: Reader<R>, origin: PathBuf) -> Self {
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            origin,
        }
    }

    /// File this stream reads from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    fn error(&self, msg: impl std::fmt::Display) -> XflError {
        XflError::parse(format!(
            "{} (byte {}): {msg}",
            self.origin.display(),
            self.reader.buffer_position()
        ))
    }

    /// Next element event, or `None` at end of input. Text, comments, and declarations are
    /// skipped.
    pub fn next_node(&mut self) -> XflResult<Option<Node>> {
        loop {
            self.buf.clear();
            let ev = match self.reader.read_event_into(&mut self.buf) {
                Ok(ev) => ev,
                Err(e) => {
                    let msg = e.to_string();
                    return Err(self.error(msg));
                }
            };
            let parsed = match ev {
                Event::Start(e) => element(&e).map(Node::Open),
                Event::Empty(e) => element(&e).map(Node::Leaf),
                Event::End(e) => Ok(Node::Close(
                    String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                )),
                Event::Eof => return Ok(None),
                _ => continue,
            };
            return parsed.map(Some).map_err(|m| self.error(m));
        }
    }

    /// Like [`XmlStream::next_node`] but treats end of input as an error.
    pub fn expect_node(&mut self) -> XflResult<Node> {
        self.next_node()?
            .ok_or_else(|| self.error("unexpected end of document"))
    }

    /// Read past the children of an [`Node::Open`] element up to and including its close tag.
    pub fn skip(&mut self, open: &Element) -> XflResult<()> {
        let mut scratch = Vec::new();
        self.reader
            .read_to_end_into(QName(open.name.as_bytes()), &mut scratch)
            .map_err(|e| self.error(e))?;
        Ok(())
    }

    /// First root element of the document.
    pub fn root(&mut self) -> XflResult<Node> {
        match self.expect_node()? {
            n @ (Node::Open(_) | Node::Leaf(_)) => Ok(n),
            Node::Close(name) => Err(self.error(format!("stray closing tag </{name}>"))),
        }
    }
}

fn element(e: &BytesStart<'_>) -> Result<Element, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("<{name}>: {err}"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| format!("<{name} {key}>: {err}"))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element { name, attrs })
}

#[cfg(test)]
#[path = "../../tests/unit/loader/xml.rs"]
mod tests;
