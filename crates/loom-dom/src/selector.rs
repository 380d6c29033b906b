//! CSS selector matching for element lookups, backed by the `selectors` crate.
//!
//! The arena is exposed to the matcher through [`ArenaElement`]. Structural
//! pseudo-classes (`:first-child`, `:nth-child()`, `:not()`, `:empty`) work;
//! state pseudo-classes and pseudo-elements are rejected at parse time.

use cssparser::{CssStringWriter, Parser as CssParser, ParserInput, ToCss, serialize_identifier};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::QuirksMode;
use selectors::matching::{
    ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, matches_selector_list,
};
use selectors::parser::{ParseRelative, SelectorParseErrorKind};
use selectors::{Element, NthIndexCache, OpaqueElement};

use crate::document::{Document, NodeId, NodeKind};
use crate::error::{DomError, Result};

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CssIdent(pub String);

impl AsRef<str> for CssIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for CssIdent {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssIdent {
    fn from(s: &'a str) -> Self {
        Self(s.to_owned())
    }
}

impl ToCss for CssIdent {
    fn to_css<W>(&self, dest: &mut W) -> std::fmt::Result
    where
        W: std::fmt::Write,
    {
        serialize_identifier(&self.0, dest)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CssAttrValue(pub String);

impl AsRef<str> for CssAttrValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssAttrValue {
    fn from(s: &'a str) -> Self {
        Self(s.to_owned())
    }
}

impl ToCss for CssAttrValue {
    fn to_css<W>(&self, dest: &mut W) -> std::fmt::Result
    where
        W: std::fmt::Write,
    {
        use std::fmt::Write;
        write!(CssStringWriter::new(dest), "{}", &self.0)
    }
}

/// Selector vocabulary without pseudo-elements or state pseudo-classes.
#[derive(Clone, Debug)]
pub enum DomSelectors {}

impl selectors::parser::SelectorImpl for DomSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssAttrValue;
    type Identifier = CssIdent;
    type LocalName = CssIdent;
    type NamespaceUrl = CssIdent;
    type NamespacePrefix = CssIdent;
    type BorrowedNamespaceUrl = str;
    type BorrowedLocalName = str;
    type NonTSPseudoClass = Never;
    type PseudoElement = Never;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Never {}

impl ToCss for Never {
    fn to_css<W>(&self, _dest: &mut W) -> std::fmt::Result
    where
        W: std::fmt::Write,
    {
        Ok(())
    }
}

impl selectors::parser::NonTSPseudoClass for Never {
    type Impl = DomSelectors;

    fn is_active_or_hover(&self) -> bool {
        false
    }

    fn is_user_action_state(&self) -> bool {
        false
    }
}

impl selectors::parser::PseudoElement for Never {
    type Impl = DomSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

struct DomSelectorParser;

impl<'i> selectors::Parser<'i> for DomSelectorParser {
    type Impl = DomSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// A parsed, comma separated selector list.
#[derive(Debug, Clone)]
pub struct SelectorList(selectors::SelectorList<DomSelectors>);

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self> {
        let mut input = ParserInput::new(source);
        let mut parser = CssParser::new(&mut input);
        selectors::SelectorList::parse(&DomSelectorParser, &mut parser, ParseRelative::No)
            .map(Self)
            .map_err(|error| DomError::InvalidSelector {
                selector: source.to_string(),
                reason: format!(
                    "{:?} at {}:{}",
                    error.kind, error.location.line, error.location.column
                ),
            })
    }

    /// Whether `node` matches any selector in the list. Non-elements never match.
    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(element) = ArenaElement::new(document, node) else {
            return false;
        };
        let mut cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        matches_selector_list(&self.0, &element, &mut context)
    }
}

/// An element node seen through the matcher.
#[derive(Clone, Copy, Debug)]
pub struct ArenaElement<'a> {
    document: &'a Document,
    id: NodeId,
}

impl<'a> ArenaElement<'a> {
    pub fn new(document: &'a Document, id: NodeId) -> Option<Self> {
        document.is_element(id).then_some(Self { document, id })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    fn wrap(&self, id: NodeId) -> Option<Self> {
        Self::new(self.document, id)
    }

    fn siblings(&self) -> &'a [NodeId] {
        match self.document.parent(self.id) {
            Some(parent) => self.document.children(parent),
            None => &[],
        }
    }

    fn position(&self) -> Option<usize> {
        self.siblings().iter().position(|sibling| *sibling == self.id)
    }

    fn tag(&self) -> &'a str {
        self.document.tag_name(self.id).unwrap_or_default()
    }
}

impl<'a> Element for ArenaElement<'a> {
    type Impl = DomSelectors;

    fn opaque(&self) -> OpaqueElement {
        match self.document.node(self.id) {
            Ok(node) => OpaqueElement::new(node),
            Err(_) => OpaqueElement::new(self.document),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.document
            .parent_element(self.id)
            .and_then(|parent| self.wrap(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let position = self.position()?;
        self.siblings()[..position]
            .iter()
            .rev()
            .find_map(|sibling| self.wrap(*sibling))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let position = self.position()?;
        self.siblings()[position + 1..]
            .iter()
            .find_map(|sibling| self.wrap(*sibling))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.document
            .children(self.id)
            .iter()
            .find_map(|child| self.wrap(*child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(
        &self,
        name: &<Self::Impl as selectors::parser::SelectorImpl>::BorrowedLocalName,
    ) -> bool {
        self.tag().eq_ignore_ascii_case(name)
    }

    fn has_namespace(
        &self,
        _ns: &<Self::Impl as selectors::parser::SelectorImpl>::BorrowedNamespaceUrl,
    ) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag().eq_ignore_ascii_case(other.tag())
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&<Self::Impl as selectors::parser::SelectorImpl>::NamespaceUrl>,
        local_name: &<Self::Impl as selectors::parser::SelectorImpl>::LocalName,
        operation: &AttrSelectorOperation<
            &<Self::Impl as selectors::parser::SelectorImpl>::AttrValue,
        >,
    ) -> bool {
        self.document
            .get_attribute(self.id, local_name.as_ref())
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &<Self::Impl as selectors::parser::SelectorImpl>::NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &<Self::Impl as selectors::parser::SelectorImpl>::PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.tag() == "a" && self.document.has_attribute(self.id, "href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn imported_part(
        &self,
        _name: &<Self::Impl as selectors::parser::SelectorImpl>::Identifier,
    ) -> Option<<Self::Impl as selectors::parser::SelectorImpl>::Identifier> {
        None
    }

    fn is_part(&self, _name: &<Self::Impl as selectors::parser::SelectorImpl>::Identifier) -> bool {
        false
    }

    fn has_id(
        &self,
        id: &<Self::Impl as selectors::parser::SelectorImpl>::Identifier,
        case: CaseSensitivity,
    ) -> bool {
        self.document
            .get_attribute(self.id, "id")
            .is_some_and(|value| case.eq(value.as_bytes(), id.as_ref().as_bytes()))
    }

    fn has_class(
        &self,
        name: &<Self::Impl as selectors::parser::SelectorImpl>::Identifier,
        case: CaseSensitivity,
    ) -> bool {
        let needle = name.as_ref().as_bytes();
        self.document
            .get_attribute(self.id, "class")
            .is_some_and(|classes| {
                classes
                    .split_ascii_whitespace()
                    .any(|class| case.eq(class.as_bytes(), needle))
            })
    }

    /// No element children and no non-empty text.
    fn is_empty(&self) -> bool {
        self.document
            .children(self.id)
            .iter()
            .all(|child| match self.document.kind(*child) {
                Some(NodeKind::Text) => self.document.text(*child).is_none_or(str::is_empty),
                Some(NodeKind::Comment) => true,
                _ => false,
            })
    }

    /// The `<body>` stands in for the document element.
    fn is_root(&self) -> bool {
        self.document
            .parent(self.id)
            .is_some_and(|parent| self.document.kind(parent) == Some(NodeKind::Document))
    }
}
