//! WASM bindings for indexing articles in the browser.
//!
//! This module exposes the indexer to JavaScript via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::{Config, index_html};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Add citation back-links to an HTML document using the default
/// conventions. Returns the rewritten HTML.
#[wasm_bindgen]
pub fn index_article(html: &str) -> Result<String, JsValue> {
    let (out, _report) =
        index_html(html, &Config::default()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(out)
}

/// One line per cited entry: `<entry id>\t<number of back-links>`.
#[wasm_bindgen]
pub fn index_summary(html: &str) -> Result<String, JsValue> {
    let (_out, report) =
        index_html(html, &Config::default()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(report
        .entries
        .iter()
        .map(|e| format!("{}\t{}", e.entry_id, e.backlinks.len()))
        .collect::<Vec<_>>()
        .join("\n"))
}
