//! Configuration trees and the XML parse boundary.
//!
//! Menu, toolbar, and view services are described declaratively: a `<gui>`
//! section lists the visual layout in order, a `<registry>` section lists the
//! service bindings in the same order. This module parses that XML into
//! [`ConfigNode`] trees and is the only place that touches the textual
//! representation; everything downstream works on the tree.
//!
//! Attribute spelling quirks are normalized here too: boolean attributes
//! accept the legacy `yes`/`no` alongside `true`/`false`, and only
//! [`ConfigNode::bool_attribute`] ever inspects the literals.
//!
//! # Example
//!
//! ```
//! use horizon_trellis::ConfigNode;
//!
//! let config = ConfigNode::parse(r#"
//!     <service>
//!         <registry>
//!             <menuItem sid="open" start="yes"/>
//!         </registry>
//!     </service>
//! "#)?;
//!
//! let registry = config.child("registry").unwrap();
//! let item = registry.child("menuItem").unwrap();
//! assert_eq!(item.attribute("sid"), Some("open"));
//! assert!(item.bool_attribute("start", false)?);
//! # Ok::<(), horizon_trellis::Error>(())
//! ```

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use horizon_trellis_core::{Error, Result};

/// One element of a configuration tree: a name, attributes, and ordered
/// child elements.
///
/// Child order is semantically load-bearing: layout items and registry
/// bindings correlate by position, so the tree preserves declaration order
/// exactly. Text content, comments, and processing instructions are not
/// part of the configuration model and are dropped during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    name: String,
    attributes: HashMap<String, String>,
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create an empty element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Parse a configuration tree from XML text.
    ///
    /// Returns the root element. Exactly one root is required.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut root: Option<ConfigNode> = None;
        let mut stack: Vec<ConfigNode> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(start)) => {
                    let element = node_from_start(&start, &reader)?;
                    stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => attach_root(&mut root, element)?,
                        }
                    }
                }
                Ok(Event::Empty(empty)) => {
                    let element = node_from_start(&empty, &reader)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => attach_root(&mut root, element)?,
                    }
                }
                // Text, CDATA, comments, declarations, and processing
                // instructions carry no configuration meaning.
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::configuration(format!(
                        "malformed configuration XML at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        root.ok_or_else(|| Error::configuration("configuration has no root element"))
    }

    /// The element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Look up an attribute that the schema requires.
    pub fn required_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name).ok_or_else(|| {
            Error::configuration(format!(
                "<{}> requires a '{name}' attribute",
                self.name
            ))
        })
    }

    /// Parse a boolean attribute, defaulting when absent.
    ///
    /// Accepts `true`/`false` and the legacy `yes`/`no` spellings.
    pub fn bool_attribute(&self, name: &str, default: bool) -> Result<bool> {
        match self.attribute(name) {
            None => Ok(default),
            Some("true") | Some("yes") => Ok(true),
            Some("false") | Some("no") => Ok(false),
            Some(other) => Err(Error::configuration(format!(
                "<{}> attribute '{name}' must be yes/no or true/false, got '{other}'",
                self.name
            ))),
        }
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: ConfigNode) {
        self.children.push(child);
    }

    /// All child elements, in declaration order.
    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// The first child with the given name.
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in declaration order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Verify this element has the expected name.
    pub fn expect_name(&self, expected: &str) -> Result<()> {
        if self.name == expected {
            Ok(())
        } else {
            Err(Error::configuration(format!(
                "expected <{expected}> element, got <{}>",
                self.name
            )))
        }
    }
}

fn attach_root(root: &mut Option<ConfigNode>, element: ConfigNode) -> Result<()> {
    if root.is_some() {
        return Err(Error::configuration(
            "configuration has more than one root element",
        ));
    }
    *root = Some(element);
    Ok(())
}

fn node_from_start<R>(start: &BytesStart<'_>, reader: &Reader<R>) -> Result<ConfigNode> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = ConfigNode::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            Error::configuration(format!(
                "malformed attribute in <{}> at byte {}: {e}",
                element.name,
                reader.buffer_position()
            ))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        element.attributes.insert(key, value);
    }

    Ok(element)
}
