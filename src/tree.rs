//! The in-memory table tree a font is decompiled into.
//!
//! The tree follows the shape of a TTX dump: a `ttFont` root element with
//! one child element per table, and each simple table field stored as a
//! child element with a `value` attribute:
//!
//! ```xml
//! <ttFont sfntVersion="\x00\x01\x00\x00">
//!   <hhea>
//!     <ascent value="800"/>
//!     <descent value="-200"/>
//!   </hhea>
//! </ttFont>
//! ```

use indexmap::IndexMap;

/// The name of the root element of a font tree.
pub const ROOT: &str = "ttFont";

/// A node in a font tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element: a name, ordered attributes and child nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Iterate over the child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// The first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// All text directly inside this element, concatenated.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The `value` attribute of the named field element.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.child(field).and_then(|c| c.attribute("value"))
    }

    /// Set the `value` attribute of the named field element, appending the
    /// field if it is not already there.
    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        match self.child_mut(field) {
            Some(child) => {
                child.attributes.insert("value".to_string(), value.into());
            }
            None => self.push(Element::new(field).with_attribute("value", value)),
        }
    }
}

/// A decompiled font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontTree {
    pub root: Element,
}

impl Default for FontTree {
    fn default() -> Self {
        FontTree {
            root: Element::new(ROOT),
        }
    }
}

impl FontTree {
    pub fn new(root: Element) -> Self {
        FontTree { root }
    }

    /// Look up a table by its XML name (`OS_2`, `hhea`, ...).
    pub fn table(&self, name: &str) -> Option<&Element> {
        self.root.child(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.root.child_mut(name)
    }

    /// Iterate over the tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Element> {
        self.root.elements()
    }

    /// Mutable access to two distinct tables at once.
    pub fn table_pair_mut(
        &mut self,
        first: &str,
        second: &str,
    ) -> (Option<&mut Element>, Option<&mut Element>) {
        let mut a = None;
        let mut b = None;
        for table in self.root.elements_mut() {
            if a.is_none() && table.name == first {
                a = Some(table);
            } else if b.is_none() && table.name == second {
                b = Some(table);
            }
        }
        (a, b)
    }
}
