//! Citation back-links.
//!
//! For every bibliography entry, find the in-text citations that point at
//! it and append one back-link per citation to the entry. Each back-link
//! navigates to the block the citation sits in and is labelled with the
//! section heading above it, so readers can jump from a reference back to
//! every place it was cited.
//!
//! ```
//! use refnav::{Config, CrossRefIndexer, IdMint};
//! use refnav::dom::parse_html;
//!
//! let mut dom = parse_html(r##"
//!     <h2>Results</h2>
//!     <p id="p1">As shown <a class="xref-bibr" href="#ref1">[1]</a>.</p>
//!     <ol><li class="cross-ref-entry" id="ref1">Smith, 2020.</li></ol>
//! "##);
//!
//! let indexer = CrossRefIndexer::new(&Config::default()).unwrap();
//! let report = indexer.index(&mut dom, &mut IdMint::with_seed(1));
//!
//! let link = &report.entries[0].backlinks[0];
//! assert_eq!(link.citation_id, "cite-ref1-1");
//! assert_eq!(link.href, "#p1");
//! assert_eq!(link.label, "Back to citation in Results: [1]");
//! ```

use std::collections::HashMap;

#[cfg(feature = "cli")]
use serde::Serialize;

use crate::config::Config;
use crate::dom::{Attribute, CompiledSelector, Dom, IdMint, NodeId};
use crate::error::Result;
use crate::navigation::fragment_of;
use crate::resolver::{HeadingInfo, normalize_whitespace, resolve_container, resolve_heading};

/// Attribute linking a back-link to the citation it returns to.
pub const CITATION_ID_ATTR: &str = "data-citation-id";

/// Back-links generated for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Serialize))]
pub struct EntryReport {
    pub entry_id: String,
    pub backlinks: Vec<BackLink>,
}

/// One generated back-link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Serialize))]
pub struct BackLink {
    /// Id of the in-text citation.
    pub citation_id: String,
    /// Navigation target, `#<block id>` or `#<citation id>`.
    pub href: String,
    /// Visible marker text.
    pub marker: String,
    /// Assistive label.
    pub label: String,
    /// Heading title, empty if none.
    pub heading: String,
}

/// Summary of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Serialize))]
pub struct IndexReport {
    /// Entries with at least one citation, in document order.
    pub entries: Vec<EntryReport>,
    /// Entries nobody cites.
    pub uncited: Vec<String>,
    /// Stale back-links removed before regenerating.
    pub removed: usize,
}

impl IndexReport {
    pub fn total_backlinks(&self) -> usize {
        self.entries.iter().map(|e| e.backlinks.len()).sum()
    }

    pub fn entry(&self, id: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.entry_id == id)
    }
}

/// Everything known about one citation before its back-link is built.
struct Citation {
    id: String,
    text: String,
    heading: HeadingInfo,
    target: String,
}

/// Builds citation back-links.
#[derive(Debug, Clone)]
pub struct CrossRefIndexer {
    entries: CompiledSelector,
    citations: CompiledSelector,
    backlink_class: String,
    glyph: String,
}

impl CrossRefIndexer {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: config.entry_selector()?,
            citations: config.citation_selector()?,
            backlink_class: config.backlink_class.clone(),
            glyph: config.marker_glyph.clone(),
        })
    }

    /// Index the document: append back-links to every cited entry.
    ///
    /// Running this again on the same document replaces the back-links of
    /// the earlier run instead of adding a second set. Ids assigned to
    /// citations, headings and blocks by an earlier run are kept.
    pub fn index(&self, dom: &mut Dom, mint: &mut IdMint) -> IndexReport {
        let _span = tracing::debug_span!("index").entered();
        let mut report = IndexReport::default();

        let entries: Vec<(NodeId, String)> = self
            .entries
            .select_all(dom, dom.document())
            .into_iter()
            .filter_map(|node| dom.element_id(node).map(|id| (node, id.to_string())))
            .collect();

        if entries.is_empty() {
            tracing::debug!(selector = self.entries.source(), "no citation entries");
            return report;
        }

        for (entry, _) in &entries {
            report.removed += self.remove_backlinks(dom, *entry);
        }

        let mut by_entry = self.citations_by_entry(dom, &entries);

        for (entry, entry_id) in &entries {
            let links = by_entry.remove(entry_id).unwrap_or_default();
            if links.is_empty() {
                report.uncited.push(entry_id.clone());
                continue;
            }

            let citations: Vec<Citation> = links
                .iter()
                .enumerate()
                .map(|(i, &link)| self.describe(dom, link, entry_id, i + 1, mint))
                .collect();

            let backlinks = self.build_backlinks(&citations);
            for backlink in &backlinks {
                self.append_backlink(dom, *entry, backlink);
            }

            tracing::debug!(entry = %entry_id, count = backlinks.len(), "back-links added");
            report.entries.push(EntryReport {
                entry_id: entry_id.clone(),
                backlinks,
            });
        }

        tracing::info!(
            entries = report.entries.len(),
            backlinks = report.total_backlinks(),
            uncited = report.uncited.len(),
            "indexed citations"
        );
        report
    }

    /// Citation links grouped by the entry id they point at, each group in
    /// document order.
    fn citations_by_entry(
        &self,
        dom: &Dom,
        entries: &[(NodeId, String)],
    ) -> HashMap<String, Vec<NodeId>> {
        let mut groups: HashMap<String, Vec<NodeId>> = entries
            .iter()
            .map(|(_, id)| (id.clone(), Vec::new()))
            .collect();

        for link in self.citations.select_all(dom, dom.document()) {
            let Some(fragment) = dom.get_attr(link, "href").and_then(fragment_of) else {
                continue;
            };
            if let Some(group) = groups.get_mut(fragment.as_ref()) {
                group.push(link);
            }
        }
        groups
    }

    fn describe(
        &self,
        dom: &mut Dom,
        link: NodeId,
        entry_id: &str,
        ordinal: usize,
        mint: &mut IdMint,
    ) -> Citation {
        let id = match dom.element_id(link) {
            Some(id) => id.to_string(),
            None => {
                // Keep the ordinal form, moving past any that is already taken.
                let mut n = ordinal;
                let mut id = format!("cite-{entry_id}-{n}");
                while dom.id_in_use(&id) {
                    n += 1;
                    id = format!("cite-{entry_id}-{n}");
                }
                dom.set_attr(link, "id", &id);
                id
            }
        };

        let heading = resolve_heading(dom, link, mint);
        let target = resolve_container(dom, link, mint).unwrap_or_else(|| id.clone());

        Citation {
            text: normalize_whitespace(&dom.text_content(link)),
            id,
            heading,
            target,
        }
    }

    fn build_backlinks(&self, citations: &[Citation]) -> Vec<BackLink> {
        let total = citations.len();

        let mut title_counts: HashMap<&str, usize> = HashMap::new();
        for c in citations.iter().filter(|c| !c.heading.title.is_empty()) {
            *title_counts.entry(c.heading.title.as_str()).or_default() += 1;
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();

        citations
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let title = c.heading.title.as_str();
                let place = if title.is_empty() {
                    String::new()
                } else if title_counts.get(title).copied().unwrap_or(0) > 1 {
                    let occurrence = seen.entry(title).or_default();
                    *occurrence += 1;
                    format!("{title} ({occurrence})")
                } else {
                    title.to_string()
                };

                let (marker, lead) = if total == 1 {
                    (self.glyph.clone(), "Back to citation".to_string())
                } else {
                    (
                        format!("{}({})", self.glyph, i + 1),
                        format!("Citation {} of {total}", i + 1),
                    )
                };

                let mut label = lead;
                if !place.is_empty() {
                    label.push_str(" in ");
                    label.push_str(&place);
                }
                if !c.text.is_empty() {
                    label.push_str(": ");
                    label.push_str(&c.text);
                }

                BackLink {
                    citation_id: c.id.clone(),
                    href: format!("#{}", c.target),
                    marker,
                    label,
                    heading: c.heading.title.clone(),
                }
            })
            .collect()
    }

    fn append_backlink(&self, dom: &mut Dom, entry: NodeId, backlink: &BackLink) {
        let mut attrs = vec![
            Attribute::new("href", backlink.href.as_str()),
            Attribute::new("class", self.backlink_class.as_str()),
        ];
        if !backlink.heading.is_empty() {
            attrs.push(Attribute::new("title", backlink.heading.as_str()));
        }
        attrs.push(Attribute::new("aria-label", backlink.label.as_str()));
        attrs.push(Attribute::new(CITATION_ID_ATTR, backlink.citation_id.as_str()));

        let anchor = dom.create_html_element("a", attrs);
        dom.append_text(anchor, &backlink.marker);
        dom.append(entry, anchor);
    }

    /// Detach back-links a previous run appended to `entry`.
    fn remove_backlinks(&self, dom: &mut Dom, entry: NodeId) -> usize {
        let stale: Vec<NodeId> = dom
            .children(entry)
            .filter(|&c| {
                dom.has_tag(c, "a")
                    && dom.has_class(c, &self.backlink_class)
                    && dom.get_attr(c, CITATION_ID_ATTR).is_some()
            })
            .collect();
        for node in &stale {
            dom.detach(*node);
        }
        stale.len()
    }
}
