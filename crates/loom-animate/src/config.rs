//! Typed view of an element's animation attributes.

use std::collections::BTreeMap;

use loom_dom::{Document, NodeId};

use crate::attribute::AnimationAttribute;
use crate::keyframes::{Keyframe, merge_keyframes};
use crate::options::PartialAnimationOptions;

/// Everything an element declares about its animation, parsed in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationConfig {
    pub keyframes: Vec<Keyframe>,
    pub options: PartialAnimationOptions,
}

impl AnimationConfig {
    pub fn from_attributes<I, N, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut declarations = Vec::new();
        let mut options = PartialAnimationOptions::new();
        for (name, value) in attributes {
            match AnimationAttribute::parse(name.as_ref(), value.as_ref()) {
                Some(AnimationAttribute::Keyframe {
                    offset,
                    property,
                    value,
                }) => declarations.push((offset, property, value)),
                Some(AnimationAttribute::Option(option)) => options.apply(option),
                None => {}
            }
        }
        Self {
            keyframes: merge_keyframes(declarations),
            options,
        }
    }

    /// Read the attributes of `element`. Non-elements yield an empty config.
    pub fn from_element(document: &Document, element: NodeId) -> Self {
        Self::from_attributes(
            document
                .attributes(element)
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }

    /// True when no keyframes were declared.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Style snapshots of the first and last keyframe, timing keys removed.
    pub fn boundary_styles(&self) -> Option<(BTreeMap<String, String>, BTreeMap<String, String>)> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        Some((first.style_snapshot(), last.style_snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pass_collects_both_namespaces() {
        let config = AnimationConfig::from_attributes([
            ("animation-keyframe-from-opacity", "0"),
            ("animation-option-duration", "120"),
            ("animation-keyframe-to-opacity", "1"),
            ("data-content", ""),
        ]);
        assert_eq!(config.keyframes.len(), 2);
        assert_eq!(config.options.duration_ms, Some(120.0));
        assert!(!config.is_empty());
    }

    #[test]
    fn test_single_keyframe_is_both_boundaries() {
        let config = AnimationConfig::from_attributes([("animation-keyframe-50-opacity", "0.5")]);
        let (start, end) = config.boundary_styles().unwrap();
        assert_eq!(start, end);
    }

    fn parse_markup(markup: &str) -> (Document, NodeId) {
        let mut document = Document::new();
        let body = document.body();
        let nodes = document.append_html(body, markup).unwrap();
        (document, nodes[0])
    }

    #[test]
    fn test_markup_order_decides_aliased_offsets() {
        for _ in 0..50 {
            let (document, element) = parse_markup(
                r#"<div animation-keyframe-from-opacity="0" animation-keyframe-0-opacity="0.5"
                        animation-keyframe-to-opacity="1" animation-keyframe-100-opacity="0.8"></div>"#,
            );
            assert_eq!(
                document.attribute_names(element),
                vec![
                    "animation-keyframe-from-opacity",
                    "animation-keyframe-0-opacity",
                    "animation-keyframe-to-opacity",
                    "animation-keyframe-100-opacity",
                ]
            );
            let config = AnimationConfig::from_element(&document, element);
            assert_eq!(config.keyframes[0].get("opacity"), Some("0.5"));
            assert_eq!(config.keyframes[1].get("opacity"), Some("0.8"));
        }

        let (document, element) = parse_markup(
            r#"<div animation-keyframe-0-opacity="0.5" animation-keyframe-from-opacity="0"></div>"#,
        );
        let config = AnimationConfig::from_element(&document, element);
        assert_eq!(config.keyframes[0].get("opacity"), Some("0"));
    }

    #[test]
    fn test_reads_from_document_element() {
        let mut document = Document::new();
        let div = document.create_element("div");
        document
            .set_attribute(div, "animation-keyframe-to-height", "10px")
            .unwrap();
        let config = AnimationConfig::from_element(&document, div);
        assert_eq!(config.keyframes[0].get("height"), Some("10px"));
        assert!(AnimationConfig::from_attributes(Vec::<(&str, &str)>::new()).is_empty());
    }
}
