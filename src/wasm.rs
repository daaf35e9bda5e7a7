//! WebAssembly bindings for the search core.
//!
//! This is what the generated `leafpress-search.js` talks to. Build it with
//! `wasm-pack build --target web --features wasm` and copy the `pkg/` output
//! into the site with `[assets.copy]`:
//!
//! ```toml
//! [assets.copy]
//! "pkg" = "wasm"
//! ```
//!
//! ```js
//! const core = await import('/assets/wasm/leafpress.js');
//! await core.default();
//! const results = core.search(await (await fetch('/search.json')).text(), 'rust +async');
//! main.innerHTML = core.mark(main.innerHTML, '["async","rust"]');
//! ```

use crate::search::highlight::parse_mark_param;
use crate::search::{self, Highlighter, ResultView, SearchOptions};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js(results: &[ResultView]) -> Result<JsValue, JsValue> {
    // Plain objects rather than ES maps for the term counts.
    results
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| e.to_string().into())
}

/// Ranked results for `query` against a serialized `search.json`.
///
/// A malformed index yields an empty array.
#[wasm_bindgen]
pub fn search(index_json: &str, query: &str) -> Result<JsValue, JsValue> {
    to_js(&search::search_json(
        index_json,
        query,
        &SearchOptions::default(),
    ))
}

/// Like [`search`] with a custom fuzzy threshold.
#[wasm_bindgen(js_name = "searchWithThreshold")]
pub fn search_with_threshold(
    index_json: &str,
    query: &str,
    fuzzy_threshold: f64,
) -> Result<JsValue, JsValue> {
    let options = SearchOptions { fuzzy_threshold };
    to_js(&search::search_json(index_json, query, &options))
}

/// Wrap the terms of the `m` parameter in `html`'s text.
#[wasm_bindgen]
pub fn mark(html: &str, m: &str) -> String {
    match Highlighter::new(parse_mark_param(m)) {
        Some(highlighter) => highlighter.mark_html(html),
        None => html.to_string(),
    }
}
