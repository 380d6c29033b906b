//! Inline style storage.
//!
//! Properties are keyed by their camel-cased scripting name (`backgroundColor`),
//! the same naming the animation engine produces from attribute segments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The inline style of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyle {
    properties: BTreeMap<String, String>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(property.into(), value.into());
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.properties.remove(property)
    }

    /// Copy every entry of `patch` over the current values.
    pub fn assign<'a, I>(&mut self, patch: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (property, value) in patch {
            self.properties.insert(property.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as a `style` attribute value (`background-color: red; opacity: 1`).
    pub fn to_css_text(&self) -> String {
        self.properties
            .iter()
            .map(|(property, value)| format!("{}: {}", kebab_case(property), value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// `backgroundColor` -> `background-color`.
pub fn kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
