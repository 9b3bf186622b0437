//! Reconciliation of externally sourced documents with the defaults.
//!
//! Renderers assume every section exists and every sequence section is an
//! array. Documents read from the remote store can be partial (only some
//! sections written yet) or carry a sequence in keyed-object form, so they
//! are merged over the bundled defaults before they replace local content.

use folio_types::SectionName;
use serde_json::{Map, Value};
use tracing::debug;

/// Merges `candidate` over `defaults`.
///
/// - Object sections present in the candidate are shallow-merged: candidate
///   keys win, default keys fill the gaps, one level deep only.
/// - Sequence sections are taken from the candidate only if they are arrays.
/// - Sections absent from the candidate (or of the wrong kind) come from the
///   defaults unchanged.
///
/// Keys outside the fixed section set are dropped.
pub fn merge_with_defaults(candidate: &Value, defaults: &Value) -> Value {
    let empty = Map::new();
    let candidate = candidate.as_object().unwrap_or(&empty);
    let mut merged = Map::new();

    for section in SectionName::ALL {
        let key = section.as_str();
        let fallback = defaults.get(key).cloned().unwrap_or(Value::Null);

        let value = match (candidate.get(key), section.is_sequence()) {
            (Some(Value::Array(items)), true) => Value::Array(items.clone()),
            (Some(Value::Object(fields)), false) => {
                let mut section_map = match fallback {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                for (k, v) in fields {
                    section_map.insert(k.clone(), v.clone());
                }
                Value::Object(section_map)
            }
            (Some(other), _) => {
                debug!(
                    "Section {} has unexpected shape ({}), using defaults",
                    key,
                    folio_model::json_type_name(other)
                );
                fallback
            }
            (None, _) => fallback,
        };
        merged.insert(key.to_string(), value);
    }

    Value::Object(merged)
}
