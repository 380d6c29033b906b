//! Arena-backed document tree.
//!
//! Nodes are addressed by [`NodeId`] and never freed; detaching a node only
//! unlinks it from its parent so it can be re-inserted elsewhere. Moving a node
//! that already has a parent detaches it first, matching DOM semantics where
//! insertion transfers ownership instead of copying.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomError, Result};
use crate::event::ListenerTable;
use crate::selector::SelectorList;
use crate::style::InlineStyle;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Fragment,
    Element,
    Text,
    Comment,
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    /// Declaration order is kept; later lookups by name find the single entry.
    attributes: Vec<(String, String)>,
    style: InlineStyle,
    /// Fragment holding a `<template>`'s inert content.
    template_content: Option<NodeId>,
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory document with a `<body>` element under its root.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    listeners: ListenerTable,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            listeners: ListenerTable::default(),
        };
        document.root = document.push(NodeData::Document);
        document.body = document.create_element("body");
        document.nodes[document.body.0].parent = Some(document.root);
        document.nodes[document.root.0].children.push(document.body);
        document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    /// Create a detached element. `<template>` elements get an empty content fragment.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let template_content = (tag == "template").then(|| self.create_fragment());
        self.push(NodeData::Element(ElementData {
            tag,
            attributes: Vec::new(),
            style: InlineStyle::new(),
            template_content,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Nodes allocated so far, attached or not. The arena never frees.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).ok().map(|node| match node.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        })
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Element)
    }

    /// Lower-case tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).ok().map(|element| element.tag.as_str())
    }

    /// Character data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeData::Text(text)) = self.node(id).ok().map(|n| &n.data) {
            out.push_str(text);
        }
        for descendant in self.descendants(id) {
            if let Some(NodeData::Text(text)) = self.node(descendant).ok().map(|n| &n.data) {
                out.push_str(text);
            }
        }
        out
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.parent
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| self.is_element(*parent))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// All descendants of `scope` in tree order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Content fragment of a `<template>` element.
    pub fn template_content(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).ok()?.template_content
    }

    pub fn is_template(&self, id: NodeId) -> bool {
        self.template_content(id).is_some()
    }

    // ---------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;
        let parent_ok = matches!(
            parent_node.data,
            NodeData::Document | NodeData::Fragment | NodeData::Element(_)
        );
        let child_ok = !matches!(child_node.data, NodeData::Document);
        if !parent_ok || !child_ok || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Unlink a node from its parent. The node stays valid.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != id);
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Append `child` to `parent`, moving it out of any previous parent.
    ///
    /// Appending a fragment moves the fragment's children instead.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        if self.kind(child) == Some(NodeKind::Fragment) {
            let moved = self.node(child)?.children.clone();
            for grandchild in moved {
                self.append_child(parent, grandchild)?;
            }
            return Ok(());
        }
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Replace every child of `parent` with `children`, in order.
    ///
    /// Previous children are detached, not destroyed. The new children may
    /// include current children of `parent`.
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        for child in children {
            self.check_insertable(parent, *child)?;
        }
        let previous = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in previous {
            self.node_mut(child)?.parent = None;
        }
        for child in children {
            self.append_child(parent, *child)?;
        }
        Ok(())
    }

    /// Copy a node (and, when `deep`, its subtree and template content).
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId> {
        let data = self.node(id)?.data.clone();
        let data = match data {
            NodeData::Element(mut element) => {
                element.template_content = match element.template_content {
                    Some(content) if deep => Some(self.clone_node(content, true)?),
                    Some(_) => Some(self.create_fragment()),
                    None => None,
                };
                NodeData::Element(element)
            }
            NodeData::Document => NodeData::Fragment,
            other => other,
        };
        let copy = self.push(data);
        if deep {
            let children = self.node(id)?.children.clone();
            for child in children {
                let child_copy = self.clone_node(child, true)?;
                self.node_mut(child_copy)?.parent = Some(copy);
                self.node_mut(copy)?.children.push(child_copy);
            }
        }
        Ok(copy)
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .ok()?
            .attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an attribute. Existing attributes keep their position.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let element = self.element_mut(id)?;
        match element.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => element.attributes.push((name, value)),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool> {
        let element = self.element_mut(id)?;
        let before = element.attributes.len();
        element
            .attributes
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        Ok(before != element.attributes.len())
    }

    /// `(name, value)` pairs in declaration order. Empty for non-elements.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|element| element.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn attribute_names(&self, id: NodeId) -> Vec<String> {
        self.attributes(id)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get_attribute(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let mut classes: Vec<String> = self
            .get_attribute(id, "class")
            .map(|c| c.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        classes.push(class.to_string());
        self.set_attribute(id, "class", classes.join(" "))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        let Some(current) = self.get_attribute(id, "class") else {
            return Ok(());
        };
        let remaining: Vec<&str> = current
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        let remaining = remaining.join(" ");
        self.set_attribute(id, "class", remaining)
    }

    // ---------------------------------------------------------------------
    // Inline style
    // ---------------------------------------------------------------------

    pub fn style(&self, id: NodeId) -> Option<&InlineStyle> {
        self.element(id).ok().map(|element| &element.style)
    }

    pub fn style_mut(&mut self, id: NodeId) -> Result<&mut InlineStyle> {
        Ok(&mut self.element_mut(id)?.style)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// First descendant of `scope` matching `selector`, in tree order.
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(self.query_selector_with(scope, &selector))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(self.query_selector_all_with(scope, &selector))
    }

    pub fn query_selector_with(&self, scope: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| selector.matches(self, *node))
    }

    pub fn query_selector_all_with(&self, scope: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerTable {
        &mut self.listeners
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    /// Markup for the node and its subtree. Inline style is emitted as a `style` attribute.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Markup for the children of the node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Document | NodeData::Fragment => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    if name == "style" && !element.style.is_empty() {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value));
                        out.push('"');
                    }
                }
                if !element.style.is_empty() {
                    out.push_str(" style=\"");
                    out.push_str(&escape_attribute(&element.style.to_css_text()));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&element.tag) {
                    return;
                }
                if let Some(content) = element.template_content {
                    self.write_html(content, out);
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_connected_body() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
    }

    #[test]
    fn test_append_moves_instead_of_copying() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_text("hello");
        doc.append_child(a, child).unwrap();
        doc.append_child(b, child).unwrap();

        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn test_append_rejects_cycles() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();
        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::HierarchyRequest {
                parent: inner,
                child: outer
            })
        );
        let text = doc.create_text("x");
        assert!(doc.append_child(text, outer).is_err());
    }

    #[test]
    fn test_fragment_children_are_moved_on_append() {
        let mut doc = Document::new();
        let fragment = doc.create_fragment();
        let one = doc.create_element("i");
        let two = doc.create_element("b");
        doc.append_child(fragment, one).unwrap();
        doc.append_child(fragment, two).unwrap();

        let target = doc.create_element("p");
        doc.append_child(target, fragment).unwrap();
        assert_eq!(doc.children(target), &[one, two]);
        assert!(doc.children(fragment).is_empty());
    }

    #[test]
    fn test_replace_children_accepts_current_children() {
        let mut doc = Document::new();
        let parent = doc.create_element("ul");
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        doc.append_child(parent, a).unwrap();
        doc.append_child(parent, b).unwrap();

        doc.replace_children(parent, &[b, a]).unwrap();
        assert_eq!(doc.children(parent), &[b, a]);

        doc.replace_children(parent, &[]).unwrap();
        assert!(doc.children(parent).is_empty());
        assert_eq!(doc.parent(a), None);
    }

    #[test]
    fn test_deep_clone_copies_template_content() {
        let mut doc = Document::new();
        let template = doc.create_element("template");
        let content = doc.template_content(template).unwrap();
        let inner = doc.create_element("span");
        doc.append_child(content, inner).unwrap();

        let copy = doc.clone_node(template, true).unwrap();
        let copy_content = doc.template_content(copy).unwrap();
        assert_ne!(copy_content, content);
        assert_eq!(doc.children(copy_content).len(), 1);
        assert_ne!(doc.children(copy_content)[0], inner);
    }

    #[test]
    fn test_attributes_keep_declaration_order() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.set_attribute(el, "b", "1").unwrap();
        doc.set_attribute(el, "a", "2").unwrap();
        doc.set_attribute(el, "B", "3").unwrap();
        assert_eq!(doc.attribute_names(el), vec!["b", "a"]);
        assert_eq!(doc.get_attribute(el, "b"), Some("3"));
        assert!(doc.remove_attribute(el, "a").unwrap());
        assert!(!doc.has_attribute(el, "a"));
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "theme-naarm").unwrap();
        doc.add_class(el, "card").unwrap();
        doc.add_class(el, "card").unwrap();
        assert_eq!(doc.get_attribute(el, "class"), Some("theme-naarm card"));
        doc.remove_class(el, "theme-naarm").unwrap();
        assert_eq!(doc.get_attribute(el, "class"), Some("card"));
    }

    #[test]
    fn test_outer_html_includes_inline_style() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.set_attribute(el, "data-state", "open").unwrap();
        doc.style_mut(el).unwrap().set("opacity", "1");
        let text = doc.create_text("a < b");
        doc.append_child(el, text).unwrap();
        assert_eq!(
            doc.outer_html(el),
            "<div data-state=\"open\" style=\"opacity: 1\">a &lt; b</div>"
        );
    }

    #[test]
    fn test_text_nodes_reject_element_operations() {
        let mut doc = Document::new();
        let text = doc.create_text("x");
        assert_eq!(
            doc.set_attribute(text, "id", "a"),
            Err(DomError::NotAnElement(text))
        );
        assert!(doc.style(text).is_none());
    }
}
