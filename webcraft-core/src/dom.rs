//! Arena document tree that remembers the source text it was parsed from.
//!
//! Every node keeps the raw markup it came from so that a document which was
//! parsed and never modified serializes back to exactly the same bytes. Nodes
//! are addressed by [`NodeId`]; ids are never reused, and cloning a
//! [`Document`] produces a deep copy in which every id still refers to the
//! corresponding node.

use std::fmt;

use crate::html;

/// Handle to a node in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source text of an attribute as it appeared in the parsed markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAttribute {
    /// Everything from the whitespace before the name to the end of the value
    pub(crate) source: String,
    pub(crate) name: String,
    pub(crate) value: Option<String>,
}

/// A single element attribute; `value` is `None` for valueless attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub(crate) raw: Option<RawAttribute>,
}

impl Attribute {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.map(str::to_string),
            raw: None,
        }
    }

    fn write_to(&self, out: &mut String) {
        if let Some(raw) = &self.raw {
            if raw.name == self.name && raw.value == self.value {
                out.push_str(&raw.source);
                return;
            }
        }

        out.push(' ');
        out.push_str(&self.name);
        if let Some(value) = &self.value {
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
    }
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub(crate) raw_name: String,
    /// Text between the last attribute and the end of the start tag, `>` included
    pub(crate) start_tail: String,
    /// Raw end tag, `None` when the source closed the element implicitly
    pub(crate) end_tag: Option<String>,
}

impl Element {
    pub(crate) fn created(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let end_tag = if html::is_void(&tag) {
            None
        } else {
            Some(format!("</{}>", tag))
        };

        Self {
            raw_name: tag.clone(),
            tag,
            attrs: Vec::new(),
            start_tail: ">".to_string(),
            end_tag,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|attr| attr.value.as_deref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: Option<&str>) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value.map(str::to_string),
            None => self.attrs.push(Attribute::new(&name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        let index = self.attrs.iter().position(|attr| attr.name == name)?;
        Some(self.attrs.remove(index))
    }

    /// Rename an attribute in place, keeping its position and value
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let to = to.to_ascii_lowercase();
        if self.has(&to) {
            return false;
        }
        match self.attrs.iter_mut().find(|attr| attr.name == from) {
            Some(attr) => {
                attr.name = to;
                true
            }
            None => false,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .map(|value| value.split_whitespace().any(|token| token == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.get("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set("class", Some(&value));
    }

    fn write_start_tag(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.raw_name);
        for attr in &self.attrs {
            attr.write_to(out);
        }
        out.push_str(&self.start_tail);
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    Comment(String),
    /// Raw text as written in the source, entities left encoded
    Text(String),
    /// Markup the tree builder could not place, such as a stray end tag
    Raw(String),
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An HTML document held as an arena of nodes
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markup into a document
    pub fn parse(source: &str) -> Self {
        html::parse_document(source)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// True when the node is still reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Ancestors from the parent up to (and including) the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// Descendants of `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// All attached elements in document order
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.element(*id).is_some())
            .collect()
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| self.is_element(*id, tag))
            .collect()
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.is_element(*id, tag))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_element_by_tag("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_element_by_tag("body")
    }

    /// True when some ancestor of `id` is an element with one of `tags`
    pub fn has_ancestor_tag(&self, id: NodeId, tags: &[&str]) -> bool {
        self.ancestors(id).into_iter().any(|ancestor| {
            self.tag_name(ancestor)
                .map(|tag| tags.contains(&tag))
                .unwrap_or(false)
        })
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.get(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id)
            .map(|element| element.has(name))
            .unwrap_or(false)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: Option<&str>) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.set(name, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        self.element_mut(id).and_then(|element| element.remove(name))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(Element::created(tag)))
    }

    /// Create a detached text node; `text` is escaped
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(
            html_escape::encode_text(text).into_owned(),
        ))
    }

    /// Create a detached text node inserted verbatim, for `script` and
    /// `style` bodies where entity escaping would change the meaning
    pub fn create_raw_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    pub(crate) fn push_parsed(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.push_node(kind);
        self.attach(parent, id, None);
        id
    }

    pub(crate) fn set_end_tag(&mut self, id: NodeId, raw: String) {
        if let Some(element) = self.element_mut(id) {
            element.end_tag = Some(raw);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            match index {
                Some(index) if index <= node.children.len() => node.children.insert(index, child),
                _ => node.children.push(child),
            }
        }
    }

    /// Remove a node from its parent; the node and its subtree stay in the arena
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        true
    }

    fn is_valid_insertion(&self, parent: NodeId, child: NodeId) -> bool {
        child != self.root()
            && child != parent
            && self.node(child).is_some()
            && self.node(parent).is_some()
            && !self.ancestors(parent).contains(&child)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.is_valid_insertion(parent, child) {
            return false;
        }
        self.detach(child);
        self.attach(parent, child, None);
        true
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.is_valid_insertion(parent, child) {
            return false;
        }
        self.detach(child);
        self.attach(parent, child, Some(0));
        true
    }

    /// Insert `child` into `reference`'s parent, right before `reference`
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        if !self.is_valid_insertion(parent, child) || child == reference {
            return false;
        }
        self.detach(child);
        let index = self.children(parent).iter().position(|id| *id == reference);
        self.attach(parent, child, index);
        true
    }

    /// Put `replacement` into the slot `old` occupies and detach `old`
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> bool {
        if !self.insert_before(old, replacement) {
            return false;
        }
        self.detach(old)
    }

    /// Decoded text of the node and its descendants, skipping script and style
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(raw)) => out.push_str(&html_escape::decode_html_entities(raw)),
            Some(NodeKind::Element(element))
                if matches!(element.tag.as_str(), "script" | "style") => {}
            Some(NodeKind::Element(_)) | Some(NodeKind::Document) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            _ => {}
        }
    }

    /// Replace all children of `id` with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        let text_node = self.create_text(text);
        self.attach(id, text_node, None);
        true
    }

    /// Serialize the whole document
    pub fn serialize(&self) -> String {
        self.serialize_node(self.root())
    }

    /// Serialize a node and its subtree
    pub fn serialize_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Doctype(raw)
            | NodeKind::Comment(raw)
            | NodeKind::Text(raw)
            | NodeKind::Raw(raw) => out.push_str(raw),
            NodeKind::Element(element) => {
                element.write_start_tag(out);
                for child in &node.children {
                    self.write_node(*child, out);
                }
                if let Some(end_tag) = &element.end_tag {
                    out.push_str(end_tag);
                }
            }
        }
    }
}
