//! Document conventions and timing.
//!
//! Defaults match the markup produced by the article templates: reference
//! list items carry `cross-ref-entry`, in-text citations are `a.xref-bibr`.

use std::time::Duration;

#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

use crate::dom::CompiledSelector;
use crate::error::{Error, Result};

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "cli", serde(default, deny_unknown_fields))]
pub struct Config {
    /// Selector for citation entries (bibliography items).
    pub entry_selector: String,
    /// Selector for in-text citation links.
    pub citation_selector: String,
    /// Class given to generated back-links.
    pub backlink_class: String,
    /// Visible back-link marker.
    pub marker_glyph: String,
    /// Class applied while drawing attention to an element.
    pub highlight_class: String,
    /// How long the highlight stays, in milliseconds.
    pub highlight_duration_ms: u64,
    /// Pixels left between the viewport top and a scrolled-to element.
    pub scroll_offset: f64,
    /// Announce navigation through an `aria-live` status element.
    pub announce: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_selector: ".cross-ref-entry".to_string(),
            citation_selector: "a.xref-bibr".to_string(),
            backlink_class: "section-link".to_string(),
            marker_glyph: "\u{21a9}".to_string(),
            highlight_class: "ref-highlight".to_string(),
            highlight_duration_ms: 2000,
            scroll_offset: 100.0,
            announce: false,
        }
    }
}

impl Config {
    /// Highlight duration as a [`Duration`].
    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_duration_ms)
    }

    /// Compile the entry selector.
    pub fn entry_selector(&self) -> Result<CompiledSelector> {
        CompiledSelector::parse(&self.entry_selector)
    }

    /// Compile the citation selector.
    pub fn citation_selector(&self) -> Result<CompiledSelector> {
        CompiledSelector::parse(&self.citation_selector)
    }

    /// Check selectors compile and class names are usable.
    pub fn validate(&self) -> Result<()> {
        self.entry_selector()?;
        self.citation_selector()?;

        for (field, class) in [
            ("backlink_class", &self.backlink_class),
            ("highlight_class", &self.highlight_class),
        ] {
            if class.is_empty() || class.contains(char::is_whitespace) {
                return Err(Error::Config(format!(
                    "{field} must be a single class name, got {class:?}"
                )));
            }
        }

        if self.marker_glyph.is_empty() {
            return Err(Error::Config("marker_glyph must not be empty".to_string()));
        }

        if !self.scroll_offset.is_finite() || self.scroll_offset < 0.0 {
            return Err(Error::Config(format!(
                "scroll_offset must be a non-negative number, got {}",
                self.scroll_offset
            )));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    #[cfg(feature = "cli")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    #[cfg(feature = "cli")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
