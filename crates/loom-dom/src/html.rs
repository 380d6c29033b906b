//! HTML fragment import.
//!
//! Markup is parsed with `scraper` (html5ever) and copied node by node into a
//! [`Document`]. `<template>` children land in the template's content fragment,
//! and whitespace-only text between elements is dropped.

use ego_tree::NodeRef;
use scraper::{Html, Node};
use tracing::trace;

use crate::document::{Document, NodeId};
use crate::error::Result;

impl Document {
    /// Build a document whose body holds the parsed fragment.
    pub fn from_html(markup: &str) -> Result<Self> {
        let mut document = Document::new();
        let body = document.body();
        document.append_html(body, markup)?;
        Ok(document)
    }

    /// Parse `markup` as a fragment and append the resulting nodes to `parent`.
    ///
    /// Returns the ids of the top-level nodes that were appended.
    pub fn append_html(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>> {
        let fragment = Html::parse_fragment(markup);
        let container = fragment.root_element();
        let mut appended = Vec::new();
        for child in container.children() {
            if let Some(id) = self.import_node(child)? {
                self.append_child(parent, id)?;
                appended.push(id);
            }
        }
        trace!(count = appended.len(), "imported html fragment");
        Ok(appended)
    }

    fn import_node(&mut self, source: NodeRef<'_, Node>) -> Result<Option<NodeId>> {
        let id = match source.value() {
            Node::Element(element) => {
                let id = self.create_element(element.name());
                // Source order, kept by scraper's `deterministic` attribute map.
                for (name, value) in element.attrs() {
                    self.set_attribute(id, name, value)?;
                }
                let target = self.template_content(id).unwrap_or(id);
                for child in source.children() {
                    if let Some(child_id) = self.import_node(child)? {
                        self.append_child(target, child_id)?;
                    }
                }
                id
            }
            Node::Text(text) => {
                let text: &str = text;
                if text.trim().is_empty() {
                    return Ok(None);
                }
                self.create_text(text)
            }
            Node::Comment(comment) => {
                let comment: &str = comment;
                self.create_comment(comment)
            }
            _ => return Ok(None),
        };
        Ok(Some(id))
    }
}
