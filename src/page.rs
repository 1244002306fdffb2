//! A live page: the document plus the bits of browser state the attention
//! director reads and writes (scroll position, focus, location fragment).

use std::collections::HashMap;

use crate::dom::{Dom, NodeId, parse_html, serialize_document};
use crate::resolver::{is_block, is_heading};

/// Visible region of the page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Document coordinate at the top edge of the viewport.
    pub scroll_y: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_y: 0.0,
            height: 800.0,
        }
    }
}

/// Source of element positions.
pub trait Layout {
    /// Top edge of an element in document coordinates, if it is laid out.
    fn element_top(&self, dom: &Dom, node: NodeId) -> Option<f64>;
}

/// Rough layout that stacks headings and block elements at a fixed height.
///
/// A block or heading sits at its index among all blocks and headings in
/// document order, times `line_height`. Inline elements share the top of the
/// last block that started before them.
#[derive(Debug, Clone, Copy)]
pub struct FlowLayout {
    pub line_height: f64,
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self { line_height: 24.0 }
    }
}

impl Layout for FlowLayout {
    fn element_top(&self, dom: &Dom, node: NodeId) -> Option<f64> {
        if !dom.is_attached(node) {
            return None;
        }
        let mut blocks = 0usize;
        for id in dom.descendants(dom.document()) {
            if is_block(dom, id) || is_heading(dom, id) {
                blocks += 1;
            }
            if id == node {
                return Some(blocks.saturating_sub(1) as f64 * self.line_height);
            }
        }
        None
    }
}

/// Layout with explicitly given positions, keyed by element id.
#[derive(Debug, Clone, Default)]
pub struct FixedLayout {
    tops: HashMap<String, f64>,
}

impl FixedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, top: f64) -> Self {
        self.tops.insert(id.to_string(), top);
        self
    }
}

impl Layout for FixedLayout {
    fn element_top(&self, dom: &Dom, node: NodeId) -> Option<f64> {
        self.tops.get(dom.element_id(node)?).copied()
    }
}

/// Document plus browser-side state.
pub struct Page {
    pub dom: Dom,
    pub viewport: Viewport,
    /// Element holding keyboard focus.
    pub focused: Option<NodeId>,
    /// Current `location.hash`, including the leading `#`, or empty.
    pub location_hash: String,
    pub layout: Box<dyn Layout>,
}

impl Page {
    pub fn from_dom(dom: Dom) -> Self {
        Self {
            dom,
            viewport: Viewport::default(),
            focused: None,
            location_hash: String::new(),
            layout: Box::new(FlowLayout::default()),
        }
    }

    pub fn parse(html: &str) -> Self {
        Self::from_dom(parse_html(html))
    }

    /// Replace the layout oracle.
    pub fn with_layout(mut self, layout: impl Layout + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    /// Current `<body>` element, if any.
    pub fn body(&self) -> Option<NodeId> {
        self.dom.find_by_tag("body")
    }

    pub fn serialize(&self) -> String {
        serialize_document(&self.dom)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("nodes", &self.dom.len())
            .field("viewport", &self.viewport)
            .field("focused", &self.focused)
            .field("location_hash", &self.location_hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_layout_stacks_blocks() {
        let page = Page::parse(r#"<h1 id="t">T</h1><p id="a">A</p><p id="b">B <a id="x">x</a></p>"#);
        let layout = FlowLayout { line_height: 10.0 };
        let top = |id: &str| layout.element_top(&page.dom, page.dom.get_by_id(id).unwrap());

        assert_eq!(top("t"), Some(0.0));
        assert_eq!(top("a"), Some(10.0));
        assert_eq!(top("b"), Some(20.0));
        // Inline content sits at the top of its block.
        assert_eq!(top("x"), Some(20.0));
    }

    #[test]
    fn test_fixed_layout_by_id() {
        let page = Page::parse(r#"<p id="para3">x</p><p>y</p>"#);
        let layout = FixedLayout::new().with("para3", 640.0);
        let p = page.dom.get_by_id("para3").unwrap();
        assert_eq!(layout.element_top(&page.dom, p), Some(640.0));

        let body = page.body().unwrap();
        assert_eq!(layout.element_top(&page.dom, body), None);
    }
}
