//! Document tree.
//!
//! HTML is parsed with html5ever into an arena-allocated tree ([`Dom`]). The
//! resolver, indexer and attention director all operate on this tree; CSS
//! selectors from the configuration match against it through [`ElementRef`].
//!
//! # Example
//!
//! ```
//! use refnav::dom::{parse_html, serialize_document};
//!
//! let dom = parse_html("<p id='para3'>Hello</p>");
//! let p = dom.get_by_id("para3").unwrap();
//! assert_eq!(dom.text_content(p), "Hello");
//! assert!(serialize_document(&dom).contains("<p id=\"para3\">Hello</p>"));
//! ```

mod arena;
mod element_ref;
mod ids;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Descendants, Dom, Node, NodeData, NodeId};
pub use element_ref::{CompiledSelector, ElementRef, RefnavSelectors};
pub use ids::IdMint;
pub use serialize::{SerializableNode, serialize_document, serialize_node};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DomSink;

/// Parse an HTML document.
pub fn parse_html(html: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse HTML bytes, detecting the encoding from a `<meta charset>` hint.
pub fn parse_html_bytes(html: &[u8]) -> Dom {
    let hint = crate::util::extract_meta_charset(html);
    let text = crate::util::decode_text(html, hint.as_deref());
    parse_html(&text)
}
