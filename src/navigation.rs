//! In-page hash-link navigation.
//!
//! Every click on an anchor whose `href` is a fragment naming a live element
//! is taken over: default navigation is suppressed, the location fragment is
//! updated, and the target gets the attention treatment. Anything else falls
//! through to the browser untouched.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::attention::{Activation, AttentionDirector};
use crate::config::Config;
use crate::dom::{Dom, NodeId};
use crate::page::Page;
use crate::timers::Clock;

/// What happened to a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Default action prevented; the target was activated.
    Intercepted {
        anchor: NodeId,
        target: NodeId,
        activation: Activation,
    },
    /// The announcement's dismiss button was clicked and it was removed.
    Dismissed,
    /// Not ours: the browser's default action should run.
    FallThrough,
}

impl ClickOutcome {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Self::Intercepted { .. })
    }
}

/// Nearest `<a>` at or above `node`.
pub fn closest_anchor(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node).filter(|&n| dom.is_element(n)).or_else(|| dom.parent_element(node));
    while let Some(el) = current {
        if dom.has_tag(el, "a") {
            return Some(el);
        }
        current = dom.parent_element(el);
    }
    None
}

/// Decoded fragment of a same-page `href` (`#frag`), or `None` for any other
/// kind of link and for a bare `#`.
pub fn fragment_of(href: &str) -> Option<Cow<'_, str>> {
    let raw = href.trim().strip_prefix('#')?;
    if raw.is_empty() {
        return None;
    }
    // Ids that aren't valid percent-encoded UTF-8 are matched literally.
    Some(
        percent_decode_str(raw)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(raw)),
    )
}

/// Global click handler for hash links.
pub struct Navigator<C: Clock> {
    director: AttentionDirector<C>,
    /// Anchor the reader last navigated away from.
    origin: Option<NodeId>,
}

impl<C: Clock> Navigator<C> {
    pub fn new(config: &Config, clock: C) -> Self {
        Self {
            director: AttentionDirector::new(config, clock),
            origin: None,
        }
    }

    pub fn director(&self) -> &AttentionDirector<C> {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut AttentionDirector<C> {
        &mut self.director
    }

    /// Anchor a later [`Navigator::return_to_origin`] would go back to.
    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }

    /// Handle a click on `clicked` (the anchor or anything inside it).
    pub fn on_click(&mut self, page: &mut Page, clicked: NodeId) -> ClickOutcome {
        if self.director.dismiss_from(page, clicked) {
            return ClickOutcome::Dismissed;
        }

        let Some((anchor, target, fragment)) = resolve_click(&page.dom, clicked) else {
            tracing::trace!(node = clicked.0, "click falls through");
            return ClickOutcome::FallThrough;
        };

        let Some(activation) = self.director.activate(page, target) else {
            return ClickOutcome::FallThrough;
        };

        page.location_hash = format!("#{fragment}");
        self.origin = Some(anchor);
        tracing::debug!(hash = %page.location_hash, "intercepted hash link");

        ClickOutcome::Intercepted {
            anchor,
            target,
            activation,
        }
    }

    /// Go back to the anchor the last intercepted click came from.
    ///
    /// Returns `None` if there is no origin or it has left the document.
    pub fn return_to_origin(&mut self, page: &mut Page) -> Option<Activation> {
        let origin = self.origin.take()?;
        if !page.dom.is_attached(origin) {
            return None;
        }
        if let Some(id) = page.dom.element_id(origin) {
            page.location_hash = format!("#{id}");
        }
        self.director.activate(page, origin)
    }

    /// Run due highlight cleanups.
    pub fn tick(&mut self, page: &mut Page) -> Vec<NodeId> {
        self.director.tick(page)
    }
}

/// Anchor, target and raw fragment for an interceptable click.
fn resolve_click(dom: &Dom, clicked: NodeId) -> Option<(NodeId, NodeId, String)> {
    let anchor = closest_anchor(dom, clicked)?;
    let href = dom.get_attr(anchor, "href")?;
    let fragment = fragment_of(href)?;
    let target = dom.get_by_id(&fragment)?;
    let raw = href.trim().strip_prefix('#')?.to_string();
    Some((anchor, target, raw))
}
