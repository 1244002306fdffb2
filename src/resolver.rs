//! Heading and block-container resolution.
//!
//! For any node, find the section heading it sits under (used to label
//! back-links) and the block element that encloses it (used as the
//! navigation and highlight target). Both walks only ever move toward the
//! document root or earlier in document order, so they always terminate.

use crate::dom::{Dom, IdMint, NodeId};

/// Heading tags, levels 1–6.
pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Tags treated as block containers.
pub const BLOCK_TAGS: &[&str] = &[
    "p", "li", "ul", "ol", "section", "article", "aside", "nav", "header", "footer", "main",
    "div",
];

/// Title and id of the heading a node sits under.
///
/// Both fields are empty when no heading precedes the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingInfo {
    pub title: String,
    pub id: String,
}

impl HeadingInfo {
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

/// Check whether a node is a heading element.
pub fn is_heading(dom: &Dom, node: NodeId) -> bool {
    dom.element_name(node)
        .is_some_and(|name| HEADING_TAGS.contains(&name.as_ref()))
}

/// Check whether a node is a block container element.
pub fn is_block(dom: &Dom, node: NodeId) -> bool {
    dom.element_name(node)
        .is_some_and(|name| BLOCK_TAGS.contains(&name.as_ref()))
}

/// Find the nearest heading by walking from `node` through previous element
/// siblings, climbing to the parent whenever a sibling chain runs out.
pub fn find_heading(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node).filter(|&n| dom.is_element(n));
    while let Some(el) = current {
        if is_heading(dom, el) {
            return Some(el);
        }
        current = dom
            .prev_element_sibling(el)
            .or_else(|| dom.parent_element(el));
    }
    None
}

/// Find the nearest block container, starting with `node` itself.
pub fn closest_container(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node).filter(|&n| dom.is_element(n)).or_else(|| dom.parent_element(node));
    while let Some(el) = current {
        if is_block(dom, el) {
            return Some(el);
        }
        current = dom.parent_element(el);
    }
    None
}

/// Return the element's id, assigning `<prefix>-<random>` first if it has none.
pub fn ensure_id(dom: &mut Dom, node: NodeId, prefix: &str, mint: &mut IdMint) -> String {
    if let Some(id) = dom.element_id(node) {
        return id.to_string();
    }
    let id = mint.mint(dom, prefix);
    tracing::trace!(%id, "assigned generated id");
    dom.set_attr(node, "id", &id);
    id
}

/// Resolve the heading a node sits under, giving the heading an id if needed.
pub fn resolve_heading(dom: &mut Dom, node: NodeId, mint: &mut IdMint) -> HeadingInfo {
    let Some(heading) = find_heading(dom, node) else {
        return HeadingInfo::default();
    };
    let id = ensure_id(dom, heading, "section", mint);
    HeadingInfo {
        title: normalize_whitespace(&dom.text_content(heading)),
        id,
    }
}

/// Resolve the block container of a node, giving it an id if needed.
pub fn resolve_container(dom: &mut Dom, node: NodeId, mint: &mut IdMint) -> Option<String> {
    let container = closest_container(dom, node)?;
    Some(ensure_id(dom, container, "block", mint))
}

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn mint() -> IdMint {
        IdMint::with_seed(1)
    }

    #[test]
    fn test_heading_from_previous_sibling() {
        let mut dom = parse_html(
            r##"<section><h2 id="methods">Methods</h2><p>See <a id="c" href="#r">[1]</a></p></section>"##,
        );
        let a = dom.get_by_id("c").unwrap();

        let info = resolve_heading(&mut dom, a, &mut mint());
        assert_eq!(info.title, "Methods");
        assert_eq!(info.id, "methods");
    }

    #[test]
    fn test_heading_climbs_through_ancestors() {
        let mut dom = parse_html(
            r##"<h1>Intro</h1><div><div><p>x</p><p><span><a id="c" href="#r">1</a></span></p></div></div>"##,
        );
        let a = dom.get_by_id("c").unwrap();

        let info = resolve_heading(&mut dom, a, &mut mint());
        assert_eq!(info.title, "Intro");
        assert!(info.id.starts_with("section-"));

        let heading = dom.find_by_tag("h1").unwrap();
        assert_eq!(dom.element_id(heading), Some(info.id.as_str()));
    }

    #[test]
    fn test_heading_text_is_normalized() {
        let mut dom = parse_html("<h3 id=\"h\">\n  Results   <em>and</em>\n discussion </h3><p id=\"p\">x</p>");
        let p = dom.get_by_id("p").unwrap();
        assert_eq!(resolve_heading(&mut dom, p, &mut mint()).title, "Results and discussion");
    }

    #[test]
    fn test_no_heading_yields_empty() {
        let mut dom = parse_html(r#"<p><a id="c">x</a></p>"#);
        let a = dom.get_by_id("c").unwrap();
        let info = resolve_heading(&mut dom, a, &mut mint());
        assert!(info.is_empty());
        assert_eq!(info, HeadingInfo::default());
    }

    #[test]
    fn test_heading_after_node_is_ignored() {
        let mut dom = parse_html(r#"<p id="p">x</p><h2>Later</h2>"#);
        let p = dom.get_by_id("p").unwrap();
        assert!(resolve_heading(&mut dom, p, &mut mint()).is_empty());
    }

    #[test]
    fn test_container_is_nearest_block() {
        let mut dom = parse_html(r#"<section id="s"><p><em><a id="c">x</a></em></p></section>"#);
        let a = dom.get_by_id("c").unwrap();

        let id = resolve_container(&mut dom, a, &mut mint()).unwrap();
        assert!(id.starts_with("block-"));
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.element_id(p), Some(id.as_str()));
    }

    #[test]
    fn test_container_keeps_existing_id() {
        let mut dom = parse_html(r#"<p id="para3"><a id="c">x</a></p>"#);
        let a = dom.get_by_id("c").unwrap();
        assert_eq!(resolve_container(&mut dom, a, &mut mint()).as_deref(), Some("para3"));
    }

    #[test]
    fn test_container_includes_self() {
        let dom = parse_html(r#"<li id="item">x</li>"#);
        let li = dom.get_by_id("item").unwrap();
        assert_eq!(closest_container(&dom, li), Some(li));
    }

    #[test]
    fn test_container_from_text_node() {
        let dom = parse_html(r#"<p id="p">text</p>"#);
        let p = dom.get_by_id("p").unwrap();
        let text = dom.children(p).next().unwrap();
        assert_eq!(closest_container(&dom, text), Some(p));
    }

    #[test]
    fn test_no_container_yields_none() {
        // body and html are not block containers.
        let mut dom = parse_html(r#"<a id="c">x</a>"#);
        let a = dom.get_by_id("c").unwrap();
        assert_eq!(resolve_container(&mut dom, a, &mut mint()), None);
    }

    #[test]
    fn test_detached_node_terminates() {
        let mut dom = parse_html(r#"<div><h2>T</h2><p id="p">x</p></div>"#);
        let p = dom.get_by_id("p").unwrap();
        dom.detach(p);
        assert_eq!(find_heading(&dom, p), None);
        assert_eq!(closest_container(&dom, p), Some(p));
    }

    #[test]
    fn test_document_root_yields_nothing() {
        let mut dom = parse_html("<p>x</p>");
        let root = dom.document();
        assert!(resolve_heading(&mut dom, root, &mut mint()).is_empty());
        assert_eq!(resolve_container(&mut dom, root, &mut mint()), None);
    }
}
