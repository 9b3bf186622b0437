//! The bundled default site content.
//!
//! `data/site.json` is compiled into the binary. It is the document every
//! store starts from and the fallback used when reconciling partial
//! documents read from a remote store.

use serde_json::Value;
use std::sync::LazyLock;

const SITE_JSON: &str = include_str!("../data/site.json");

static DEFAULT_DOCUMENT: LazyLock<Value> = LazyLock::new(|| {
    serde_json::from_str(SITE_JSON).expect("bundled data/site.json is valid JSON")
});

/// Returns the bundled default document.
pub fn default_document() -> Value {
    DEFAULT_DOCUMENT.clone()
}
