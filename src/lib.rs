//! # refnav
//!
//! Reference navigation for rendered journal articles.
//!
//! ## Features
//!
//! - Back-links from every bibliography entry to each place it is cited,
//!   labelled with the section heading for screen readers
//! - Heading and block-container resolution for any node
//! - Hash-link click handling that scrolls to, highlights and focuses the
//!   target, with the highlight cleared a fixed time after the last visit
//!
//! The document is an explicit tree parsed with html5ever. Browser state
//! (scroll position, focus, the location fragment) lives in a [`Page`], and
//! time comes from a [`Clock`], so everything can be driven and checked
//! without a rendering engine.
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use refnav::{Config, CrossRefIndexer, IdMint, Navigator, Page, VirtualClock};
//!
//! let mut page = Page::parse(r##"
//!     <h2>Methods</h2>
//!     <p id="para3">We follow <a class="xref-bibr" href="#ref1">[1]</a>.</p>
//!     <ol><li class="cross-ref-entry" id="ref1">Smith, 2020.</li></ol>
//! "##);
//!
//! let config = Config::default();
//! let report = CrossRefIndexer::new(&config)?.index(&mut page.dom, &mut IdMint::new());
//! assert_eq!(report.total_backlinks(), 1);
//!
//! let clock = VirtualClock::new();
//! let mut nav = Navigator::new(&config, clock.clone());
//!
//! // Follow the generated back-link from the reference to the paragraph.
//! let entry = page.dom.get_by_id("ref1").unwrap();
//! let backlink = page.dom.children(entry).last().unwrap();
//! assert!(nav.on_click(&mut page, backlink).is_intercepted());
//! assert_eq!(page.location_hash, "#para3");
//!
//! clock.advance(Duration::from_millis(2000));
//! nav.tick(&mut page);
//! # Ok::<(), refnav::Error>(())
//! ```

pub mod attention;
pub mod config;
pub mod dom;
pub mod error;
pub mod indexer;
pub mod navigation;
pub mod page;
pub mod resolver;
pub mod timers;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use attention::{Activation, AttentionDirector, Effect, ScrollRequest};
pub use config::Config;
pub use dom::{Dom, IdMint, NodeId, parse_html, parse_html_bytes, serialize_document};
pub use error::{Error, Result};
pub use indexer::{BackLink, CrossRefIndexer, EntryReport, IndexReport};
pub use navigation::{ClickOutcome, Navigator};
pub use page::{FixedLayout, FlowLayout, Layout, Page, Viewport};
pub use resolver::{HeadingInfo, resolve_container, resolve_heading};
pub use timers::{Clock, HighlightTimers, SystemClock, VirtualClock};

/// Parse an HTML document, add citation back-links and serialize it again.
pub fn index_html(html: &str, config: &Config) -> Result<(String, IndexReport)> {
    let indexer = CrossRefIndexer::new(config)?;
    let mut dom = parse_html(html);
    let report = indexer.index(&mut dom, &mut IdMint::new());
    Ok((serialize_document(&dom), report))
}
