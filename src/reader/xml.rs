//! XML document trees
//!
//! Template documents are read into a small owned element tree with
//! `quick-xml`. Parsers navigate the tree through [`Fragment`], which keeps
//! track of the element path so that every parse failure can point at the
//! offending fragment.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::error::ParseError;
use crate::utils::sanitize::{clean, clean_opt};

/// Child element holding the value in QHP-style templates
const CELL_VALUE: &str = "cellValue";

/// An XML element with its attributes, text and child elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlNode {
    /// Local element name (namespace prefix dropped)
    pub name: String,
    /// Attributes as (local name, unescaped value)
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an element without content
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a document and return its root element
    pub fn parse_str(document: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event()
                .map_err(|e| ParseError::new(format!("byte {position}"), e.to_string()))?;
            match event {
                Event::Start(start) => stack.push(element(&start, position)?),
                Event::Empty(start) => {
                    let node = element(&start, position)?;
                    attach(&mut stack, &mut root, node, position)?;
                }
                Event::End(_) => {
                    let node = stack.pop().ok_or_else(|| {
                        ParseError::new(format!("byte {position}"), "unbalanced closing tag")
                    })?;
                    attach(&mut stack, &mut root, node, position)?;
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| ParseError::new(path_of(&stack), e.to_string()))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&value);
                    }
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&bytes));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ParseError::new(path_of(&stack), "unclosed element at end of document"));
        }
        root.ok_or_else(|| ParseError::new("/", "document has no root element"))
    }

    /// First child element with the given local name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All child elements with the given local name
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a XmlNode> {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Attribute value by local name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Scalar value of this element: its `cellValue` child when present,
    /// otherwise its own text
    #[must_use]
    pub fn value(&self) -> &str {
        match self.child(CELL_VALUE) {
            Some(cell) => &cell.text,
            None => &self.text,
        }
    }
}

fn element(start: &BytesStart<'_>, position: u64) -> Result<XmlNode, ParseError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut node = XmlNode::new(name);
    for attribute in start.attributes() {
        let attribute = attribute
            .map_err(|e| ParseError::new(format!("byte {position}"), e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| ParseError::new(format!("byte {position}"), e.to_string()))?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
    position: u64,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(ParseError::new(
                format!("byte {position}"),
                "document has more than one root element",
            ));
        }
    }
    Ok(())
}

fn path_of(stack: &[XmlNode]) -> String {
    stack.iter().map(|n| n.name.as_str()).collect::<Vec<_>>().join("/")
}

/// A node together with its path from the document root
#[derive(Debug, Clone)]
pub struct Fragment<'a> {
    node: &'a XmlNode,
    path: String,
}

impl<'a> Fragment<'a> {
    /// Wrap a document root
    #[must_use]
    pub fn root(node: &'a XmlNode) -> Self {
        Self {
            node,
            path: node.name.clone(),
        }
    }

    /// The wrapped node
    #[must_use]
    pub fn node(&self) -> &'a XmlNode {
        self.node
    }

    /// Element name
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    /// Path of this fragment, `root/list/item[2]`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parse error located at this fragment
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.path.clone(), message)
    }

    /// Parse error located at a named field of this fragment
    #[must_use]
    pub fn field_error(&self, field: &str, message: impl Into<String>) -> ParseError {
        ParseError::new(format!("{}/{field}", self.path), message)
    }

    /// Cleaned scalar value of a child field, empty when absent
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        clean(self.raw(field))
    }

    /// Cleaned scalar value of the first non-blank field among aliases
    #[must_use]
    pub fn text_any(&self, fields: &[&str]) -> String {
        fields
            .iter()
            .map(|field| self.text(field))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    /// Cleaned scalar value of a child field, `None` when absent or blank
    #[must_use]
    pub fn opt_text(&self, field: &str) -> Option<String> {
        clean_opt(self.raw(field))
    }

    /// Raw (uncleaned) value of a child field
    #[must_use]
    pub fn raw(&self, field: &str) -> Option<&'a str> {
        self.node.child(field).map(XmlNode::value)
    }

    /// Cleaned value of a field that must be present and non-blank
    pub fn required_text(&self, field: &str) -> Result<String, ParseError> {
        self.opt_text(field)
            .ok_or_else(|| self.field_error(field, "required value is missing"))
    }

    /// Single nested child element
    #[must_use]
    pub fn nested(&self, name: &str) -> Option<Fragment<'a>> {
        self.node.child(name).map(|node| Fragment {
            node,
            path: format!("{}/{}", self.path, node.name),
        })
    }

    /// Repeated child elements, descending through an optional list element
    ///
    /// `items("moopList", "moop")` yields every `moop` under `moopList`. When
    /// the list wrapper is missing the items are looked up directly under this
    /// fragment, which some template generations do.
    #[must_use]
    pub fn items(&self, list: &str, item: &str) -> Vec<Fragment<'a>> {
        let (parent, parent_path) = match self.node.child(list) {
            Some(list_node) => (list_node, format!("{}/{}", self.path, list_node.name)),
            None => (self.node, self.path.clone()),
        };
        parent
            .children_named(item)
            .enumerate()
            .map(|(index, node)| Fragment {
                node,
                path: format!("{parent_path}/{}[{index}]", node.name),
            })
            .collect()
    }
}
