//! Drawing the reader's attention to a navigation target.
//!
//! Activation scrolls the target into view, marks it with the highlight
//! class and moves keyboard focus to it. The highlight and the temporary
//! `tabindex` are removed by a cleanup that runs a fixed time after the
//! *last* activation of the same element:
//!
//! ```text
//! idle --activate--> highlighted --activate--> highlighted (deadline pushed back)
//!                        |
//!                        +--deadline reached--> idle
//! ```
//!
//! Time is supplied by a [`Clock`]; hosts call [`AttentionDirector::tick`]
//! (or [`AttentionDirector::on_timer_expire`] from their own timer callback)
//! to run due cleanups.

use std::time::Duration;

use crate::config::Config;
use crate::dom::{Attribute, NodeId};
use crate::page::Page;
use crate::resolver::{closest_container, is_block, is_heading, normalize_whitespace};
use crate::timers::{Clock, HighlightTimers, PendingCleanup};

/// Marker attribute on the status element used for announcements.
const ANNOUNCER_ATTR: &str = "data-refnav-announcer";

/// Class of the button that removes the announcement.
pub const DISMISS_CLASS: &str = "dismiss-announcement";

/// Longest announcement text before it is cut.
const ANNOUNCE_MAX_CHARS: usize = 80;

/// Where the viewport was asked to scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    /// New `scroll_y`.
    pub top: f64,
    /// Whether the fixed offset was subtracted.
    pub offset_applied: bool,
    pub smooth: bool,
}

/// Observable effect of an activation, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AddClass(NodeId),
    ScrollTo(ScrollRequest),
    Focus(NodeId),
    Announce(String),
}

/// Result of activating a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    /// Element the activation was requested for.
    pub target: NodeId,
    /// Element actually highlighted (the target or its block container).
    pub highlighted: NodeId,
    /// A pending cleanup for the same element was cancelled.
    pub superseded: bool,
    /// When the highlight will be removed.
    pub deadline: Duration,
    pub effects: Vec<Effect>,
}

impl Activation {
    pub fn scroll(&self) -> Option<ScrollRequest> {
        self.effects.iter().find_map(|e| match e {
            Effect::ScrollTo(req) => Some(*req),
            _ => None,
        })
    }
}

/// Scrolls to, highlights and focuses navigation targets.
pub struct AttentionDirector<C: Clock> {
    clock: C,
    timers: HighlightTimers,
    highlight_class: String,
    duration: Duration,
    scroll_offset: f64,
    announce: bool,
}

impl<C: Clock> AttentionDirector<C> {
    pub fn new(config: &Config, clock: C) -> Self {
        Self {
            clock,
            timers: HighlightTimers::new(),
            highlight_class: config.highlight_class.clone(),
            duration: config.highlight_duration(),
            scroll_offset: config.scroll_offset,
            announce: config.announce,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn timers(&self) -> &HighlightTimers {
        &self.timers
    }

    /// Element that activating `target` would highlight.
    pub fn highlight_element(&self, page: &Page, target: NodeId) -> NodeId {
        let dom = &page.dom;
        if is_heading(dom, target) || is_block(dom, target) {
            return target;
        }
        closest_container(dom, target).unwrap_or(target)
    }

    /// Draw attention to `target`.
    ///
    /// Returns `None` (and does nothing) when `target` is not an element in
    /// the live document.
    pub fn activate(&mut self, page: &mut Page, target: NodeId) -> Option<Activation> {
        if !page.dom.is_element(target) || !page.dom.is_attached(target) {
            return None;
        }

        let element = self.highlight_element(page, target);
        let previous = self.timers.cancel(element);
        let superseded = previous.is_some();
        let mut effects = Vec::new();

        if page.dom.add_class(element, &self.highlight_class) {
            effects.push(Effect::AddClass(element));
        }

        if let Some(request) = self.scroll_request(page, element) {
            page.viewport.scroll_y = request.top;
            effects.push(Effect::ScrollTo(request));
        }

        // A superseded cleanup already holds the tabindex from before any
        // highlighting; the current "-1" is our own.
        let prior_tabindex = match previous {
            Some(pending) => pending.prior_tabindex,
            None => page.dom.get_attr(element, "tabindex").map(str::to_string),
        };
        page.dom.set_attr(element, "tabindex", "-1");
        page.focused = Some(element);
        effects.push(Effect::Focus(element));

        if self.announce
            && let Some(message) = self.announce_navigation(page, target)
        {
            effects.push(Effect::Announce(message));
        }

        let deadline = self.clock.now() + self.duration;
        self.timers.schedule(element, deadline, prior_tabindex);

        tracing::debug!(
            target = target.0,
            highlighted = element.0,
            superseded,
            "drew attention"
        );

        Some(Activation {
            target,
            highlighted: element,
            superseded,
            deadline,
            effects,
        })
    }

    /// Scroll position for an element: its top minus the fixed offset, unless
    /// that would land above the document top, in which case the element's
    /// own top (never negative) is used.
    fn scroll_request(&self, page: &Page, element: NodeId) -> Option<ScrollRequest> {
        let natural = page.layout.element_top(&page.dom, element)?;
        let with_offset = natural - self.scroll_offset;

        let (top, offset_applied) = if with_offset >= 0.0 {
            (with_offset, true)
        } else {
            (natural.max(0.0), false)
        };

        Some(ScrollRequest {
            top,
            offset_applied,
            smooth: true,
        })
    }

    /// Run every cleanup that is due. Returns the elements cleaned up.
    pub fn tick(&mut self, page: &mut Page) -> Vec<NodeId> {
        let due = self.timers.take_due(self.clock.now());
        due.into_iter()
            .map(|(element, pending)| {
                self.clean_up(page, element, pending);
                element
            })
            .collect()
    }

    /// Handle a host timer firing for `element`.
    ///
    /// Does nothing if the element has no pending cleanup or if its cleanup
    /// was pushed back by a later activation. Returns `true` if the element
    /// was cleaned up.
    pub fn on_timer_expire(&mut self, page: &mut Page, element: NodeId) -> bool {
        let due = self
            .timers
            .get(element)
            .is_some_and(|p| p.deadline <= self.clock.now());
        if !due {
            return false;
        }
        match self.timers.cancel(element) {
            Some(pending) => {
                self.clean_up(page, element, pending);
                true
            }
            None => false,
        }
    }

    /// Check whether an element is currently highlighted.
    pub fn is_highlighted(&self, page: &Page, element: NodeId) -> bool {
        self.timers.is_pending(element) && page.dom.has_class(element, &self.highlight_class)
    }

    fn clean_up(&mut self, page: &mut Page, element: NodeId, pending: PendingCleanup) {
        page.dom.remove_class(element, &self.highlight_class);
        match pending.prior_tabindex {
            Some(value) => page.dom.set_attr(element, "tabindex", &value),
            None => {
                page.dom.remove_attr(element, "tabindex");
            }
        }
        tracing::debug!(element = element.0, "highlight removed");
    }

    /// Remove the announcement element, if there is one.
    pub fn dismiss_announcement(&self, page: &mut Page) -> bool {
        let Some(status) = page.body().and_then(|body| announcer(page, body)) else {
            return false;
        };
        page.dom.detach(status);
        tracing::debug!("announcement dismissed");
        true
    }

    /// Handle a click that may have landed on the announcement's dismiss
    /// button. Returns `true` if the announcement was removed.
    pub fn dismiss_from(&self, page: &mut Page, clicked: NodeId) -> bool {
        let dom = &page.dom;
        let button = std::iter::successors(Some(clicked), |&n| dom.parent_element(n))
            .find(|&n| dom.has_tag(n, "button") && dom.has_class(n, DISMISS_CLASS));
        let Some(status) = button.and_then(|b| dom.parent_element(b)) else {
            return false;
        };
        if dom.get_attr(status, ANNOUNCER_ATTR).is_none() {
            return false;
        }
        page.dom.detach(status);
        tracing::debug!("announcement dismissed");
        true
    }

    /// Write a polite status message naming the target, followed by a
    /// dismiss button. The status element is created once under `<body>`
    /// and reused.
    fn announce_navigation(&self, page: &mut Page, target: NodeId) -> Option<String> {
        let body = page.body()?;
        let name = normalize_whitespace(&page.dom.text_content(target));
        let name = if name.is_empty() {
            page.dom.element_id(target).unwrap_or_default().to_string()
        } else {
            truncate_chars(&name, ANNOUNCE_MAX_CHARS)
        };
        let message = format!("Navigated to {name}");

        let existing = announcer(page, body);
        let dom = &mut page.dom;
        let status = match existing {
            Some(existing) => {
                let old: Vec<_> = dom.children(existing).collect();
                for child in old {
                    dom.detach(child);
                }
                existing
            }
            None => {
                let status = dom.create_html_element(
                    "div",
                    vec![
                        Attribute::new("role", "status"),
                        Attribute::new("aria-live", "polite"),
                        Attribute::new("class", "sr-only dismissible-announcement"),
                        Attribute::new(ANNOUNCER_ATTR, ""),
                    ],
                );
                dom.append(body, status);
                status
            }
        };
        dom.append_text(status, &message);

        let dismiss = dom.create_html_element(
            "button",
            vec![
                Attribute::new("type", "button"),
                Attribute::new("class", DISMISS_CLASS),
                Attribute::new("aria-label", "Dismiss announcement"),
            ],
        );
        dom.append_text(dismiss, "\u{00d7}");
        dom.append(status, dismiss);

        Some(message)
    }
}

fn announcer(page: &Page, body: NodeId) -> Option<NodeId> {
    page.dom
        .children(body)
        .find(|&c| page.dom.get_attr(c, ANNOUNCER_ATTR).is_some())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}\u{2026}", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::FixedLayout;
    use crate::timers::VirtualClock;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn setup(html: &str) -> (Page, AttentionDirector<VirtualClock>, VirtualClock) {
        let clock = VirtualClock::new();
        let page = Page::parse(html).with_layout(
            FixedLayout::new()
                .with("para3", 640.0)
                .with("near-top", 40.0)
                .with("h", 300.0),
        );
        let director = AttentionDirector::new(&Config::default(), clock.clone());
        (page, director, clock)
    }

    #[test]
    fn test_activate_highlights_container() {
        let (mut page, mut director, _clock) =
            setup(r#"<p id="para3">Some <em id="term">term</em></p>"#);
        let term = page.dom.get_by_id("term").unwrap();
        let para = page.dom.get_by_id("para3").unwrap();

        let activation = director.activate(&mut page, term).unwrap();
        assert_eq!(activation.highlighted, para);
        assert!(page.dom.has_class(para, "ref-highlight"));
        assert!(!page.dom.has_class(term, "ref-highlight"));
        assert_eq!(page.dom.get_attr(para, "tabindex"), Some("-1"));
        assert_eq!(page.focused, Some(para));
    }

    #[test]
    fn test_effects_in_order() {
        let (mut page, mut director, _clock) = setup(r#"<p id="para3">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();

        let activation = director.activate(&mut page, para).unwrap();
        let scroll = activation.scroll().unwrap();
        assert_eq!(
            activation.effects,
            vec![
                Effect::AddClass(para),
                Effect::ScrollTo(scroll),
                Effect::Focus(para)
            ]
        );
    }

    #[test]
    fn test_scroll_offset_applied() {
        let (mut page, mut director, _clock) = setup(r#"<p id="para3">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();

        let scroll = director.activate(&mut page, para).unwrap().scroll().unwrap();
        assert_eq!(scroll.top, 540.0);
        assert!(scroll.offset_applied);
        assert_eq!(page.viewport.scroll_y, 540.0);
    }

    #[test]
    fn test_scroll_offset_skipped_near_top() {
        let (mut page, mut director, _clock) = setup(r#"<p id="near-top">x</p>"#);
        let p = page.dom.get_by_id("near-top").unwrap();

        let scroll = director.activate(&mut page, p).unwrap().scroll().unwrap();
        assert_eq!(scroll.top, 40.0);
        assert!(!scroll.offset_applied);
    }

    #[test]
    fn test_heading_is_highlighted_directly() {
        let (mut page, mut director, _clock) = setup(r#"<section><h2 id="h">Title</h2></section>"#);
        let h = page.dom.get_by_id("h").unwrap();
        assert_eq!(director.activate(&mut page, h).unwrap().highlighted, h);
    }

    #[test]
    fn test_cleanup_after_duration() {
        let (mut page, mut director, clock) = setup(r#"<p id="para3">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();
        director.activate(&mut page, para).unwrap();

        clock.advance(ms(1999));
        assert!(director.tick(&mut page).is_empty());
        assert!(page.dom.has_class(para, "ref-highlight"));

        clock.advance(ms(1));
        assert_eq!(director.tick(&mut page), vec![para]);
        assert_eq!(page.dom.get_attr(para, "class"), None);
        assert_eq!(page.dom.get_attr(para, "tabindex"), None);
        assert_eq!(director.timers().pending_count(), 0);
    }

    #[test]
    fn test_reactivation_extends_without_flicker() {
        let (mut page, mut director, clock) = setup(r#"<p id="para3">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();

        director.activate(&mut page, para).unwrap();
        clock.advance(ms(1500));
        let second = director.activate(&mut page, para).unwrap();
        assert!(second.superseded);
        // Class was already there; no re-add.
        assert!(!second.effects.contains(&Effect::AddClass(para)));
        assert_eq!(director.timers().pending_count(), 1);

        // The first activation's deadline passes without effect.
        clock.advance(ms(600));
        assert!(director.tick(&mut page).is_empty());
        assert!(!director.on_timer_expire(&mut page, para));
        assert!(director.is_highlighted(&page, para));

        clock.advance(ms(1400));
        assert_eq!(director.tick(&mut page), vec![para]);
        assert!(!page.dom.has_class(para, "ref-highlight"));
    }

    #[test]
    fn test_prior_tabindex_restored_after_reactivation() {
        let (mut page, mut director, clock) = setup(r#"<p id="para3" tabindex="2" class="lead">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();

        director.activate(&mut page, para).unwrap();
        director.activate(&mut page, para).unwrap();
        clock.advance(ms(2000));
        director.tick(&mut page);

        assert_eq!(page.dom.get_attr(para, "tabindex"), Some("2"));
        assert_eq!(page.dom.get_attr(para, "class"), Some("lead"));
    }

    #[test]
    fn test_on_timer_expire_when_due() {
        let (mut page, mut director, clock) = setup(r#"<p id="para3">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();
        director.activate(&mut page, para).unwrap();

        clock.advance(ms(2000));
        assert!(director.on_timer_expire(&mut page, para));
        assert!(!director.on_timer_expire(&mut page, para));
        assert!(!page.dom.has_class(para, "ref-highlight"));
    }

    #[test]
    fn test_detached_target_is_ignored() {
        let (mut page, mut director, _clock) = setup(r#"<p id="para3">x</p>"#);
        let para = page.dom.get_by_id("para3").unwrap();
        page.dom.detach(para);

        assert!(director.activate(&mut page, para).is_none());
        assert_eq!(director.timers().pending_count(), 0);
    }

    #[test]
    fn test_announcement_reuses_status_element() {
        let clock = VirtualClock::new();
        let config = Config {
            announce: true,
            ..Config::default()
        };
        let mut director = AttentionDirector::new(&config, clock);
        let mut page = Page::parse(r#"<p id="a">First paragraph</p><p id="b">Second</p>"#);
        let a = page.dom.get_by_id("a").unwrap();
        let b = page.dom.get_by_id("b").unwrap();

        director.activate(&mut page, a).unwrap();
        let activation = director.activate(&mut page, b).unwrap();
        assert_eq!(
            activation.effects.last(),
            Some(&Effect::Announce("Navigated to Second".to_string()))
        );

        let html = page.serialize();
        assert_eq!(html.matches("aria-live=\"polite\"").count(), 1);
        assert!(html.contains(">Navigated to Second<button"));
        assert_eq!(html.matches("dismiss-announcement").count(), 1);
    }

    #[test]
    fn test_dismiss_button_removes_announcement() {
        let config = Config {
            announce: true,
            ..Config::default()
        };
        let mut director = AttentionDirector::new(&config, VirtualClock::new());
        let mut page = Page::parse(r#"<p id="a">First</p>"#);
        let a = page.dom.get_by_id("a").unwrap();
        director.activate(&mut page, a).unwrap();

        let button = page
            .dom
            .descendants(page.dom.document())
            .find(|&n| page.dom.has_class(n, DISMISS_CLASS))
            .unwrap();
        assert_eq!(page.dom.get_attr(button, "aria-label"), Some("Dismiss announcement"));
        assert_eq!(page.dom.get_attr(button, "type"), Some("button"));

        assert!(!director.dismiss_from(&mut page, a));
        assert!(director.dismiss_from(&mut page, button));
        assert!(!page.serialize().contains("aria-live"));
        assert!(!director.dismiss_announcement(&mut page));

        // The next announcement brings a fresh status element.
        director.activate(&mut page, a).unwrap();
        assert!(page.serialize().contains(">Navigated to First<button"));
        assert!(director.dismiss_announcement(&mut page));
    }

    #[test]
    fn test_scroll_offset_boundaries() {
        let clock = VirtualClock::new();
        let mut page = Page::parse(
            r#"<p id="exact">a</p><p id="just-below">b</p><p id="above">c</p>"#,
        )
        .with_layout(
            FixedLayout::new()
                .with("exact", 100.0)
                .with("just-below", 99.5)
                .with("above", -20.0),
        );
        let mut director = AttentionDirector::new(&Config::default(), clock);
        let mut scroll_for = |id: &str| {
            let node = page.dom.get_by_id(id).unwrap();
            director.activate(&mut page, node).unwrap().scroll().unwrap()
        };

        let exact = scroll_for("exact");
        assert_eq!(exact.top, 0.0);
        assert!(exact.offset_applied);

        let just_below = scroll_for("just-below");
        assert_eq!(just_below.top, 99.5);
        assert!(!just_below.offset_applied);

        let above = scroll_for("above");
        assert_eq!(above.top, 0.0);
        assert!(!above.offset_applied);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef ghij", 7), "abcdef\u{2026}");
    }
}
