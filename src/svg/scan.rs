//! Markup scanning
//!
//! Thin layer over `quick_xml::Reader` that turns model output into the
//! nodes the validator inspects. End-name matching is off so unbalanced
//! fragments still scan; anything the reader cannot tokenize is reported
//! as a [`ScanError`] rather than skipped.

use std::borrow::Cow;

use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Element tag flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<name ...>`
    Start,
    /// `</name>`
    End,
    /// `<name ... />`
    Empty,
}

/// Constructs whose content is not markup to an XML reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    Comment,
    CData,
    /// `<?...?>`, including the XML declaration
    Instruction,
    DocType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name, e.g. `xlink:href`
    pub name: String,
    /// Name without its namespace prefix
    pub local_name: String,
    /// Value with entities decoded where possible
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Byte offset of the opening `<`
    pub offset: usize,
    pub kind: ElementKind,
    pub name: String,
    pub local_name: String,
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Look up an attribute by exact qualified name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Element(Element),
    Opaque {
        offset: usize,
        kind: OpaqueKind,
        /// Full source text, delimiters included
        raw: &'a str,
    },
}

/// Markup the reader could not tokenize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub offset: usize,
    pub reason: String,
}

/// Iterator over the element and opaque nodes of a markup string.
///
/// Text nodes are skipped. Iteration ends after the first error.
pub struct Nodes<'a> {
    src: &'a str,
    reader: Reader<&'a [u8]>,
    done: bool,
}

/// Scan `markup` in document order
pub fn nodes(markup: &str) -> Nodes<'_> {
    let mut reader = Reader::from_str(markup);
    reader.check_end_names(false);
    Nodes {
        src: markup,
        reader,
        done: false,
    }
}

/// The first element of `markup`, reading no further than needed
pub fn first_element(markup: &str) -> Result<Option<Element>, ScanError> {
    for node in nodes(markup) {
        if let Node::Element(element) = node? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Result<Node<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let offset = self.reader.buffer_position() as usize;
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ScanError {
                        offset,
                        reason: e.to_string(),
                    }));
                }
            };
            let end = self.reader.buffer_position() as usize;
            let raw = self.src.get(offset..end).unwrap_or_default();

            let opaque = |kind| Some(Ok(Node::Opaque { offset, kind, raw }));
            let item = match event {
                Event::Start(ref e) => Some(element(offset, ElementKind::Start, e)),
                Event::Empty(ref e) => Some(element(offset, ElementKind::Empty, e)),
                Event::End(ref e) => Some(named(offset, e.name().as_ref()).map(|(name, local)| {
                    Node::Element(Element {
                        offset,
                        kind: ElementKind::End,
                        name,
                        local_name: local,
                        attributes: Vec::new(),
                    })
                })),
                Event::Comment(_) => opaque(OpaqueKind::Comment),
                Event::CData(_) => opaque(OpaqueKind::CData),
                Event::Decl(_) | Event::PI(_) => opaque(OpaqueKind::Instruction),
                Event::DocType(_) => opaque(OpaqueKind::DocType),
                Event::Text(_) => None,
                Event::Eof => {
                    self.done = true;
                    None
                }
            };

            if let Some(item) = item {
                if item.is_err() {
                    self.done = true;
                }
                return Some(item);
            }
        }
        None
    }
}

fn element<'a>(offset: usize, kind: ElementKind, tag: &BytesStart<'_>) -> Result<Node<'a>, ScanError> {
    let (name, local_name) = named(offset, tag.name().as_ref())?;

    let mut attributes = Vec::new();
    for attr in tag.html_attributes().with_checks(false) {
        let attr = attr.map_err(|e| ScanError {
            offset,
            reason: format!("unreadable attributes in <{}>: {}", name, e),
        })?;
        attributes.push(convert_attribute(&attr));
    }

    Ok(Node::Element(Element {
        offset,
        kind,
        name,
        local_name,
        attributes,
    }))
}

fn convert_attribute(attr: &XmlAttribute<'_>) -> Attribute {
    let value = attr
        .unescape_value()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
    Attribute {
        name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
        local_name: String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
        value,
    }
}

/// Qualified and local name of a tag. A `<` that does not start a name is
/// text to an HTML parser but a tag to the reader, so it is refused.
fn named(offset: usize, qname: &[u8]) -> Result<(String, String), ScanError> {
    let starts_name = qname
        .first()
        .map_or(false, |b| b.is_ascii_alphabetic() || *b == b'_');
    if !starts_name {
        return Err(ScanError {
            offset,
            reason: "'<' not followed by an element name".to_string(),
        });
    }

    let name = String::from_utf8_lossy(qname).into_owned();
    let local_name = match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.clone(),
    };
    Ok((name, local_name))
}
