//! Array-shape normalization.
//!
//! Document stores hand back sequences as maps keyed by their indices
//! (`{"0": a, "1": b}`), either because the sequence was written that way or
//! because the store flattened it. Readers expect arrays, so every load and
//! every real-time delivery passes through [`normalize_document`].
//!
//! Only fields the schema declares as sequences are touched. Any other map
//! keeps its shape even if every key happens to be numeric.

use folio_model::{sequence_fields, PathStep};
use folio_types::SectionName;
use serde_json::{Map, Value};
use tracing::debug;

/// Returns true if `key` is an unsigned integer index.
pub fn is_index_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true if `map` is non-empty and every key is an index.
pub fn is_index_keyed(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| is_index_key(k))
}

/// Rebuilds an index-keyed map as an array ordered by numeric key.
///
/// Keys that overflow `u64` sort last; equal numeric keys (`"1"`, `"01"`)
/// keep lexical order. Gaps are closed.
pub fn sequence_from_map(map: Map<String, Value>) -> Vec<Value> {
    let mut entries: Vec<(Option<u64>, String, Value)> = map
        .into_iter()
        .map(|(k, v)| (k.parse::<u64>().ok(), k, v))
        .collect();
    entries.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.len().cmp(&b.1.len()).then_with(|| a.1.cmp(&b.1)),
    });
    entries.into_iter().map(|(_, _, v)| v).collect()
}

/// Replaces `value` with an array if it is an index-keyed map. Returns
/// whether it changed.
pub fn normalize_value(value: &mut Value) -> bool {
    match value {
        Value::Object(map) if is_index_keyed(map) => {
            let map = std::mem::take(map);
            *value = Value::Array(sequence_from_map(map));
            true
        }
        _ => false,
    }
}

fn walk_mut(steps: &[PathStep<'_>], value: &mut Value, f: &mut dyn FnMut(&mut Value)) {
    let Some((step, rest)) = steps.split_first() else {
        f(value);
        return;
    };
    match step {
        PathStep::Key(key) => {
            if let Some(child) = value.as_object_mut().and_then(|m| m.get_mut(*key)) {
                walk_mut(rest, child, f);
            }
        }
        PathStep::Each => {
            if let Some(items) = value.as_array_mut() {
                for item in items {
                    walk_mut(rest, item, f);
                }
            }
        }
    }
}

/// Normalizes every declared sequence field of a (possibly partial)
/// document in place. Returns the number of fields rebuilt.
///
/// Parents are visited before children, so `skills.categories` is an
/// array by the time each category's `skills` is checked.
pub fn normalize_document(doc: &mut Value) -> usize {
    let mut rebuilt = 0;
    for field in sequence_fields() {
        walk_mut(&field.steps(), doc, &mut |v| {
            if normalize_value(v) {
                rebuilt += 1;
            }
        });
    }
    if rebuilt > 0 {
        debug!("Normalized {} keyed sequence(s)", rebuilt);
    }
    rebuilt
}

/// Normalizes one section payload.
pub fn normalize_section(section: SectionName, payload: Value) -> Value {
    let key = section.as_str();
    let mut doc = Value::Object(Map::from_iter([(key.to_string(), payload)]));
    normalize_document(&mut doc);
    match doc {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
