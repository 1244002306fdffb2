//! `selectors` integration for the arena DOM.
//!
//! Entry and citation conventions are configured as CSS selectors; this
//! module lets those selectors match against a parsed [`Dom`].

use std::fmt;

use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{ParseRelative, Selector, SelectorList, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use super::arena::{Dom, NodeData, NodeId};
use crate::error::{Error, Result};

/// Selector implementation marker for the arena DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefnavSelectors;

/// Identifier / attribute value string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        self.0
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for IdentStr {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for IdentStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl cssparser::ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// Interned local name usable as a selector atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// Interned namespace URL usable as a selector atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl<'a> From<&'a str> for CssNamespace {
    fn from(s: &'a str) -> Self {
        Self(Namespace::from(s))
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// No pseudo-elements are supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = RefnavSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// Pseudo-classes meaningful for a static document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {
    Link,
    AnyLink,
}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = RefnavSelectors;

    fn is_active_or_hover(&self) -> bool {
        false
    }

    fn is_user_action_state(&self) -> bool {
        false
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(match self {
            Self::Link => ":link",
            Self::AnyLink => ":any-link",
        })
    }
}

impl<'i> selectors::parser::Parser<'i> for RefnavSelectors {
    type Impl = RefnavSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: cssparser::SourceLocation,
        name: cssparser::CowRcStr<'i>,
    ) -> std::result::Result<NonTSPseudoClass, cssparser::ParseError<'i, Self::Error>> {
        match name.as_ref() {
            "link" => Ok(NonTSPseudoClass::Link),
            "any-link" => Ok(NonTSPseudoClass::AnyLink),
            _ => Err(location.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            )),
        }
    }
}

impl SelectorImpl for RefnavSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Reference to an element in the [`Dom`] for selector matching.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub dom: &'a Dom,
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(dom: &'a Dom, id: NodeId) -> Self {
        Self { dom, id }
    }

    fn wrap(&self, id: Option<NodeId>) -> Option<Self> {
        id.map(|id| Self::new(self.dom, id))
    }

    fn is_anchor_with_href(&self) -> bool {
        self.dom.has_tag(self.id, "a") && self.dom.get_attr(self.id, "href").is_some()
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.dom.element_name(self.id))
            .finish()
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = RefnavSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        self.wrap(self.dom.parent_element(self.id))
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
        self.wrap(self.dom.prev_element_sibling(self.id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let mut current = self.dom.get(self.id)?.next_sibling;
        while current.is_some() {
            if self.dom.is_element(current) {
                return Some(Self::new(self.dom, current));
            }
            current = self.dom.get(current)?.next_sibling;
        }
        None
    }

    fn first_element_child(&self) -> Option<Self> {
        let first = self
            .dom
            .children(self.id)
            .find(|&child| self.dom.is_element(child));
        self.wrap(first)
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.dom.element_name(self.id) == Some(&name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        match self.dom.get(self.id).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => name.ns == ns.0,
            _ => false,
        }
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.dom.element_name(self.id) == other.dom.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        let Some(NodeData::Element { attrs, .. }) = self.dom.get(self.id).map(|n| &n.data) else {
            return false;
        };

        attrs
            .iter()
            .filter(|attr| attr.name.local == local_name.0)
            .filter(|attr| match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            })
            .any(|attr| operation.eval_str(&attr.value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            NonTSPseudoClass::Link | NonTSPseudoClass::AnyLink => self.is_anchor_with_href(),
        }
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        self.is_anchor_with_href()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_id(self.id)
            .is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .classes(self.id)
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.dom.children(self.id).all(|child| match self.dom.get(child).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => false,
            Some(NodeData::Text(t)) => t.is_empty(),
            _ => true,
        })
    }

    fn is_root(&self) -> bool {
        let parent = self.dom.parent(self.id);
        matches!(self.dom.get(parent).map(|n| &n.data), Some(NodeData::Document))
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

/// A parsed selector list together with its source text.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    selectors: Vec<Selector<RefnavSelectors>>,
}

impl CompiledSelector {
    /// Parse a comma-separated selector list.
    pub fn parse(source: &str) -> Result<Self> {
        let mut input = cssparser::ParserInput::new(source);
        let mut parser = cssparser::Parser::new(&mut input);
        let list = SelectorList::parse(&RefnavSelectors, &mut parser, ParseRelative::No)
            .map_err(|_| Error::InvalidSelector(source.to_string()))?;
        parser
            .expect_exhausted()
            .map_err(|_| Error::InvalidSelector(source.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            selectors: list.slice().to_vec(),
        })
    }

    /// The selector text this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check whether an element matches any selector in the list.
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        if !dom.is_element(node) {
            return false;
        }
        let elem = ElementRef::new(dom, node);
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );

        self.selectors.iter().any(|selector| {
            selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
        })
    }

    /// All matching elements under `root`, in document order.
    pub fn select_all(&self, dom: &Dom, root: NodeId) -> Vec<NodeId> {
        dom.descendants(root)
            .filter(|&node| self.matches(dom, node))
            .collect()
    }
}
